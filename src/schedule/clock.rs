//! # Wall-clock grid quantization.
//!
//! [`next_tick`] maps "now" onto the next boundary of a fixed grid:
//!
//! ```text
//!   offset
//!   ├──►│         interval       │         interval       │
//! ──────┼────────────────────────┼────────────────────────┼──► wall clock
//!     t(k)           ▲         t(k+1)                   t(k+2)
//!                   now ───────► returns t(k+1)
//! ```
//!
//! ## Rules
//! - The result is **strictly after** `now` (a tick exactly at `now` is already due).
//! - `result - offset` is an exact multiple of `interval`.
//! - Each call recomputes from the wall clock instead of adding to the previous
//!   target, so processing time never accumulates as lag.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ConveyorError;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Source of wall-clock time for the event sequence.
pub trait Clock: Send + Sync + 'static {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Shared handle to a clock.
pub type ClockRef = Arc<dyn Clock>;

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Validated tick grid: `interval > 0` and `offset < interval`.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use chrono::DateTime;
/// use conveyor::Schedule;
///
/// let s = Schedule::new(Duration::from_secs(5), Duration::from_secs(2)).unwrap();
/// let now = DateTime::from_timestamp(103, 0).unwrap();
/// assert_eq!(s.next_tick(now).timestamp(), 107);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    interval: Duration,
    offset: Duration,
}

impl Schedule {
    /// Validates and builds a schedule.
    ///
    /// Intervals longer than `i64::MAX` nanoseconds (~292 years) are rejected as well.
    pub fn new(interval: Duration, offset: Duration) -> Result<Self, ConveyorError> {
        let fits = interval.as_nanos() <= i64::MAX as u128;
        if interval.is_zero() || offset >= interval || !fits {
            return Err(ConveyorError::InvalidSchedule { interval, offset });
        }
        Ok(Self { interval, offset })
    }

    /// Tick spacing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Shift of every tick relative to the interval grid.
    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Shorthand for [`next_tick`].
    pub fn next_tick(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_tick(self, now)
    }
}

/// Computes the first grid boundary strictly after `now`.
///
/// `t0 = floor(now / interval) * interval + offset`; if `t0 <= now`, one more interval is added.
/// Floor is Euclidean, so instants before the Unix epoch quantize the same way.
pub fn next_tick(schedule: &Schedule, now: DateTime<Utc>) -> DateTime<Utc> {
    let interval = schedule.interval.as_nanos() as i128;
    let offset = schedule.offset.as_nanos() as i128;
    let now_ns = to_nanos(now);

    let mut t0 = now_ns.div_euclid(interval) * interval + offset;
    if t0 <= now_ns {
        t0 += interval;
    }
    from_nanos(t0)
}

fn to_nanos(t: DateTime<Utc>) -> i128 {
    i128::from(t.timestamp()) * NANOS_PER_SEC + i128::from(t.timestamp_subsec_nanos())
}

fn from_nanos(ns: i128) -> DateTime<Utc> {
    let secs = ns.div_euclid(NANOS_PER_SEC);
    let nanos = ns.rem_euclid(NANOS_PER_SEC) as u32;
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, nanos))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
