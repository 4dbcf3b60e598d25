//! # Conveyor configuration.
//!
//! Provides [`ConveyorConfig`], the settings fixed for a conveyor's lifetime.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → unbounded delivery queue (overflow policy unused)
//! - `call_timeout = 0s` → no per-call deadline on producer/consumer calls
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use conveyor::{ConveyorConfig, OverflowPolicy};
//!
//! let mut cfg = ConveyorConfig::default();
//! cfg.interval = Duration::from_secs(300);
//! cfg.offset = Duration::from_secs(120);
//! cfg.queue_capacity = 16;
//! cfg.overflow = OverflowPolicy::DropOldest;
//!
//! assert_eq!(cfg.queue_limit(), Some(16));
//! assert!(cfg.call_deadline().is_none());
//! assert!(cfg.schedule().is_ok());
//! ```

use std::time::Duration;

use crate::error::ConveyorError;
use crate::policies::OverflowPolicy;
use crate::schedule::Schedule;

/// Shortest watchdog poll period; smaller values are clamped up to this.
const MIN_WATCHDOG_POLL: Duration = Duration::from_millis(1);

/// Configuration for a conveyor.
///
/// ## Field semantics
/// - `interval`, `offset`: tick grid (`interval > 0`, `offset < interval`; checked by [`schedule`](Self::schedule))
/// - `watchdog_poll`: watchdog heartbeat period (min 1ms)
/// - `skew_grace`: pause after a tick found already in the past
/// - `subscriber_grace`: how long subscribers may drain their queues at shutdown
/// - `queue_capacity`: bounded queue size (`0` = unbounded)
/// - `overflow`: what a full bounded queue does
/// - `call_timeout`: per-call deadline (`0s` = none)
/// - `bus_capacity`: notice bus ring buffer size (min 1)
/// - `handle_os_signals`: watchdog also stops on SIGINT/SIGTERM/SIGQUIT (Ctrl-C on Windows)
/// - `thread_name`: name of the dedicated worker thread
#[derive(Clone, Debug)]
pub struct ConveyorConfig {
    /// Spacing between ticks.
    pub interval: Duration,

    /// Shift of every tick within the interval grid.
    ///
    /// Ticks normally land where `wall_clock mod interval == 0`; the offset
    /// moves them later, e.g. to wait for a data source that publishes late.
    pub offset: Duration,

    /// Watchdog heartbeat period.
    ///
    /// A stop request is observed immediately regardless; the heartbeat only
    /// bounds how long a missed wake-up could go unnoticed.
    pub watchdog_poll: Duration,

    /// Pause taken after a tick is found to be in the past (clock moved).
    pub skew_grace: Duration,

    /// Time subscribers get to drain their queues once the pipeline has ended.
    ///
    /// Workers still busy afterwards are aborted, so a slow or hung
    /// [`Subscribe`](crate::Subscribe) cannot keep the conveyor running.
    pub subscriber_grace: Duration,

    /// Capacity of the delivery queue.
    ///
    /// - `0` = unbounded (items accumulate if consumers stall)
    /// - `n > 0` = at most `n` queued items; see [`overflow`](Self::overflow)
    pub queue_capacity: usize,

    /// Overflow policy for a bounded queue.
    pub overflow: OverflowPolicy,

    /// Deadline applied to each producer and consumer call.
    ///
    /// - `Duration::ZERO` = no deadline (a hung call stalls its stage)
    /// - `> 0` = the call fails with `CallError::Timeout`
    pub call_timeout: Duration,

    /// Capacity of the notice bus broadcast channel.
    pub bus_capacity: usize,

    /// Whether the watchdog also treats OS termination signals as a stop request.
    pub handle_os_signals: bool,

    /// Name given to the dedicated worker thread.
    pub thread_name: String,
}

impl ConveyorConfig {
    /// Validates `interval`/`offset` into a [`Schedule`].
    pub fn schedule(&self) -> Result<Schedule, ConveyorError> {
        Schedule::new(self.interval, self.offset)
    }

    /// Returns the queue capacity as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → bounded to `n` items
    #[inline]
    pub fn queue_limit(&self) -> Option<usize> {
        if self.queue_capacity == 0 {
            None
        } else {
            Some(self.queue_capacity)
        }
    }

    /// Returns the per-call deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → deadline applied to each call
    #[inline]
    pub fn call_deadline(&self) -> Option<Duration> {
        if self.call_timeout == Duration::ZERO {
            None
        } else {
            Some(self.call_timeout)
        }
    }

    /// Returns the watchdog poll period clamped to a minimum of 1ms.
    #[inline]
    pub fn watchdog_poll_clamped(&self) -> Duration {
        self.watchdog_poll.max(MIN_WATCHDOG_POLL)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ConveyorConfig {
    /// Default configuration:
    ///
    /// - `interval = 30s`, `offset = 0s`
    /// - `watchdog_poll = 1.5s`
    /// - `skew_grace = 200ms`
    /// - `subscriber_grace = 500ms`
    /// - `queue_capacity = 0` (unbounded), `overflow = Block`
    /// - `call_timeout = 0s` (no deadline)
    /// - `bus_capacity = 1024`
    /// - `handle_os_signals = false`
    /// - `thread_name = "conveyor"`
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            offset: Duration::ZERO,
            watchdog_poll: Duration::from_millis(1500),
            skew_grace: Duration::from_millis(200),
            subscriber_grace: Duration::from_millis(500),
            queue_capacity: 0,
            overflow: OverflowPolicy::default(),
            call_timeout: Duration::ZERO,
            bus_capacity: 1024,
            handle_os_signals: false,
            thread_name: "conveyor".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_none() {
        let cfg = ConveyorConfig::default();
        assert_eq!(cfg.queue_limit(), None);
        assert_eq!(cfg.call_deadline(), None);
        assert_eq!(cfg.watchdog_poll_clamped(), Duration::from_millis(1500));
        assert!(cfg.subscriber_grace < cfg.watchdog_poll);
    }

    #[test]
    fn clamps_apply() {
        let cfg = ConveyorConfig {
            watchdog_poll: Duration::ZERO,
            bus_capacity: 0,
            call_timeout: Duration::from_secs(2),
            ..ConveyorConfig::default()
        };
        assert_eq!(cfg.watchdog_poll_clamped(), Duration::from_millis(1));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.call_deadline(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn offset_must_stay_inside_interval() {
        let cfg = ConveyorConfig {
            interval: Duration::from_secs(5),
            offset: Duration::from_secs(5),
            ..ConveyorConfig::default()
        };
        assert!(matches!(
            cfg.schedule(),
            Err(ConveyorError::InvalidSchedule { .. })
        ));
    }
}
