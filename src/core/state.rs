//! # State shared between the caller's thread and the worker.
//!
//! ```text
//!  caller thread                         worker thread
//!  ─────────────                         ─────────────
//!  start()  ── started.swap(true)
//!           ── running = true ─────────► (spawned)
//!  stop()   ── stop.cancel() ──────────► watchdog: stop.cancelled() ─► unwind
//!  is_running() ◄── running ◄──────────  RunningGuard::drop ─► running = false
//! ```
//!
//! `running` is only a liveness hint; callers poll it. The stop request is a
//! [`CancellationToken`] so the watchdog can await it instead of polling.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Liveness flag, single-use latch and stop request of one conveyor.
#[derive(Debug, Default)]
pub(crate) struct ConveyorState {
    started: AtomicBool,
    running: AtomicBool,
    stop: CancellationToken,
}

impl ConveyorState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Flips the single-use latch; `false` if it was already set.
    pub(crate) fn try_start(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn was_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn request_stop(&self) {
        self.stop.cancel();
    }

    pub(crate) fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Resolves once a stop has been requested.
    pub(crate) async fn stop_requested(&self) {
        self.stop.cancelled().await
    }
}

/// Clears `running` when dropped, including on unwind.
pub(crate) struct RunningGuard<'a>(pub(crate) &'a ConveyorState);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set_running(false);
    }
}
