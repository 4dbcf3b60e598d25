//! # Notice subscribers.
//!
//! User code observes a running conveyor either by reading the broadcast
//! receiver from [`Conveyor::subscribe`](crate::Conveyor::subscribe), or by
//! registering [`Subscribe`] implementations that are driven from the worker
//! runtime:
//!
//! ```text
//! stages ── publish(Notice) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                            ├──► LogWriter
//!                                                            └──► custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
