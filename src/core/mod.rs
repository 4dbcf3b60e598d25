//! Runtime core: pipeline stages and lifecycle.
//!
//! The public API from this module is [`Conveyor`] and its [`ConveyorBuilder`],
//! plus the value types they expose.
//!
//! Internal modules:
//! - [`production`]: waits for each tick, calls the producer, enqueues the result;
//! - [`consumption`]: dequeues items and fans them out to every consumer;
//! - [`watchdog`]: turns a stop request (or OS signal) into pipeline termination;
//! - [`supervisor`]: runs the three stages and tears down on the first exit;
//! - [`runner`]: one producer/consumer call with an optional deadline;
//! - [`shutdown`]: cross-platform OS signal handling.

mod builder;
mod config;
mod consumption;
mod conveyor;
mod production;
mod queue;
mod runner;
mod shutdown;
mod stage;
mod state;
mod supervisor;
mod watchdog;

pub use builder::ConveyorBuilder;
pub use config::ConveyorConfig;
pub use conveyor::Conveyor;
pub use queue::{DeliveryQueue, Pushed, QueueItem};
pub use stage::Stage;

pub(crate) use supervisor::panic_message;
