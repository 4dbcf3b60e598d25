//! # Producer and consumer abstractions.
//!
//! This module provides the plug-in contract of the conveyor:
//! - [`Produce`] - trait for the single producer called once per event
//! - [`Consume`] - trait for consumers fanned out to for every produced payload
//! - [`ProduceFn`], [`ConsumeFn`] - closure-backed implementations
//! - [`ProducerRef`], [`ConsumerRef`] - shared handles (`Arc<dyn ...>`)
//!
//! Both traits are generic over the payload type `P`, so a mismatched
//! producer/consumer pair fails to compile instead of failing at run time.

mod consume;
mod produce;

pub use consume::{Consume, ConsumeFn, ConsumerRef, ResultCode};
pub use produce::{Produce, ProduceFn, ProducerRef};
