//! # Watchdog: turns a stop request into pipeline termination.
//!
//! ```text
//! loop {
//!   select! {
//!     sleep(poll)          → heartbeat; stop flag set? → exit
//!     stop.cancelled()     → exit
//!     os signal (opt-in)   → request stop, exit
//!   }
//! }
//! exit: publish StopRequested → Err(ConveyorError::StopRequested)
//! ```
//!
//! The error unwinds the supervisor's join like any other stage exit; the
//! supervisor reports it as a normal stop.

use std::convert::Infallible;
use std::future::{Future, pending};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::{select, time};
use tracing::{info, trace, warn};

use crate::core::shutdown;
use crate::core::stage::Stage;
use crate::core::state::ConveyorState;
use crate::error::ConveyorError;
use crate::notices::{Bus, Notice, NoticeKind};

pub(crate) struct Watchdog {
    pub(crate) state: Arc<ConveyorState>,
    pub(crate) poll: Duration,
    pub(crate) os_signals: bool,
    pub(crate) bus: Bus,
}

impl Watchdog {
    /// Runs until a stop is requested (by `Conveyor::stop` or, if enabled, an OS signal).
    pub(crate) async fn run(self) -> Result<Infallible, ConveyorError> {
        let signal = os_signal(self.os_signals, shutdown::wait_for_shutdown_signal());
        tokio::pin!(signal);

        let mut beats: u64 = 0;
        loop {
            select! {
                _ = time::sleep(self.poll) => {
                    trace!(beats, "watchdog: awoke");
                    if self.state.is_stop_requested() {
                        break;
                    }
                    beats += 1;
                }
                _ = self.state.stop_requested() => break,
                _ = &mut signal => {
                    info!("watchdog: termination signal received");
                    self.state.request_stop();
                    break;
                }
            }
        }

        info!(beats, "watchdog: stop requested, terminating pipeline");
        self.bus.publish(
            Notice::new(NoticeKind::StopRequested)
                .with_stage(Stage::Watchdog)
                .with_reason(format!("after {beats} heartbeats")),
        );
        Err(ConveyorError::StopRequested)
    }
}

/// Resolves when `wait` reports a signal; never resolves when disabled or
/// when signal registration fails.
async fn os_signal<F>(enabled: bool, wait: F)
where
    F: Future<Output = io::Result<()>>,
{
    if !enabled {
        return pending::<()>().await;
    }
    if let Err(e) = wait.await {
        warn!(error = %e, "watchdog: cannot listen for OS signals");
        pending::<()>().await;
    }
}
