//! # Notice bus for broadcasting conveyor notices.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from the stages and the supervisor.
//!
//! ## Architecture
//! ```text
//! Publishers (worker thread):          Receivers (any thread):
//!   EventSequence ──┐
//!   Production    ──┤                  ┌──► subscriber_listener ──► SubscriberSet
//!   Consumption   ──┼──────► Bus ──────┤      (in supervisor)
//!   Supervisor    ──┘  (broadcast)     └──► Conveyor::subscribe() receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent notices for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: notices are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::notice::Notice;

/// Broadcast channel for conveyor notices.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone, and `Send + Sync`, so the caller's thread can hold one.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Notice>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Notice>(capacity);
        Self { tx }
    }

    /// Publishes a notice to all active receivers.
    ///
    /// If there are no receivers, the notice is dropped.
    pub fn publish(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }

    /// Creates a new receiver that will observe subsequent notices.
    ///
    /// A receiver only gets notices **sent after** it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}
