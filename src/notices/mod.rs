//! Conveyor notices: types and broadcast bus.
//!
//! ## Contents
//! - [`NoticeKind`], [`Notice`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `EventSequence`, production and consumption stages, the
//!   watchdog, the supervisor, and `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's subscriber listener (fans out to
//!   `SubscriberSet`) and any receiver obtained from `Conveyor::subscribe`.

mod bus;
mod notice;

pub use bus::Bus;
pub use notice::{Notice, NoticeKind};
