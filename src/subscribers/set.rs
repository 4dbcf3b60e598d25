//! # Non-blocking notice fan-out to subscribers.
//!
//! ```text
//! emit(notice)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_notice()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_notice()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_notice()
//! ```
//!
//! ## Rules
//! - `emit()` never waits: it uses `try_send`.
//! - A full queue drops the notice for that subscriber only and publishes `SubscriberOverflow`.
//! - A panicking subscriber is reported as `SubscriberPanicked` and keeps receiving.
//! - Each subscriber sees notices in publish order; there is no ordering across subscribers.
//! - [`shutdown_within`](SubscriberSet::shutdown_within) bounds the final drain; workers
//!   still busy when the grace elapses are aborted.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle, time};

use crate::core::panic_message;
use crate::notices::{Bus, Notice, NoticeKind};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Notice>>,
}

/// Fan-out of bus notices to user subscribers, one queue and worker each.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber on the current runtime.
    ///
    /// Queue capacity comes from [`Subscribe::queue_capacity`], at least 1.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Notice>>(sub.queue_capacity().max(1));
            let bus_for_worker = bus.clone();

            workers.push(tokio::spawn(async move {
                while let Some(notice) = rx.recv().await {
                    let fut = sub.on_notice(notice.as_ref());
                    if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                        bus_for_worker.publish(Notice::subscriber_panicked(
                            sub.name(),
                            panic_message(panic.as_ref()),
                        ));
                    }
                }
            }));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Queues `notice` for every subscriber without waiting.
    pub fn emit(&self, notice: &Notice) {
        if self.channels.is_empty() {
            return;
        }
        let notice = Arc::new(notice.clone());
        // never report an overflow of an overflow notice
        let is_overflow = notice.kind == NoticeKind::SubscriberOverflow;

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&notice)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow {
                self.bus
                    .publish(Notice::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// Closes every queue and gives the workers `grace` to drain them.
    ///
    /// Returns `false` if the grace elapsed; the remaining workers are then aborted.
    pub async fn shutdown_within(self, grace: Duration) -> bool {
        drop(self.channels);
        let mut workers = self.workers;

        let drained = time::timeout(grace, async {
            for h in workers.iter_mut() {
                let _ = h.await;
            }
        })
        .await
        .is_ok();

        if !drained {
            for h in &workers {
                h.abort();
            }
        }
        drained
    }
}
