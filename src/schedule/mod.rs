//! # Scheduling: tick grid and event sequence.
//!
//! - [`Schedule`], [`next_tick`] pure grid quantization
//! - [`Clock`], [`SystemClock`] wall-clock source
//! - [`EventSequence`] lazy timer producing realized [`Event`]s

mod clock;
mod sequence;

#[cfg(test)]
pub(crate) use clock::test_clocks;

pub use clock::{Clock, ClockRef, Schedule, SystemClock, next_tick};
pub use sequence::{Event, EventSequence};
