//! # Observability notices emitted by the conveyor.
//!
//! A [`Notice`] is a record of something the conveyor did: a realized event was
//! produced, a tick was skipped, consumers finished, a stage failed, and so on.
//! Notices are distinct from the scheduled [`Event`]s that flow through the
//! pipeline; a notice may *reference* one.
//!
//! ## Ordering guarantees
//! Each notice has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use conveyor::{Notice, NoticeKind};
//!
//! let n = Notice::new(NoticeKind::StageFailed).with_reason("boom");
//! assert_eq!(n.kind, NoticeKind::StageFailed);
//! assert_eq!(n.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::Stage;
use crate::handlers::ResultCode;
use crate::schedule::Event;

/// Global sequence counter for notice ordering.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    // === Lifecycle ===
    /// Worker is up and the three stages are about to launch.
    ConveyorStarted,

    /// Stop request observed by the watchdog.
    StopRequested,

    /// Worker is tearing down.
    ///
    /// Sets:
    /// - `reason`: terminal reason (`"stop requested"` for a normal stop)
    ConveyorStopped,

    // === Pipeline ===
    /// A tick was already in the past when computed; nothing emitted.
    ///
    /// Sets:
    /// - `event_time`: the skipped tick (`event` is not set: no counter was consumed)
    TickSkipped,

    /// Producer returned a payload for an event.
    ///
    /// Sets:
    /// - `event`, `name` (producer)
    EventProduced,

    /// Bounded queue displaced its oldest item (`DropOldest`).
    ///
    /// Sets:
    /// - `event`: the displaced item's event
    QueueOverflow,

    /// All consumers returned for an item.
    ///
    /// Sets:
    /// - `event`, `results` (registration order)
    ConsumersCompleted,

    /// A stage ended with an error.
    ///
    /// Sets:
    /// - `stage`, `reason`, and `event` when the error carries one
    StageFailed,

    // === Subscribers ===
    /// Subscriber panicked during notice processing.
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped a notice (queue full or worker closed).
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Notice with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`NoticeKind`]
#[derive(Clone, Debug)]
pub struct Notice {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notice classification.
    pub kind: NoticeKind,

    /// Stage the notice concerns.
    pub stage: Option<Stage>,
    /// Pipeline event the notice concerns.
    pub event: Option<Event>,
    /// Tick time for notices without a realized event (skips).
    pub event_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Producer, consumer or subscriber name.
    pub name: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Joined consumer results, in registration order.
    pub results: Option<Arc<[ResultCode]>>,
}

impl Notice {
    /// Creates a new notice of the given kind with current timestamp and next sequence number.
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            stage: None,
            event: None,
            event_time: None,
            name: None,
            reason: None,
            results: None,
        }
    }

    /// Attaches a stage.
    #[inline]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Attaches a pipeline event (and its time).
    #[inline]
    pub fn with_event(mut self, event: &Event) -> Self {
        self.event = Some(*event);
        self.event_time = Some(event.event_time);
        self
    }

    /// Attaches a bare tick time.
    #[inline]
    pub fn with_event_time(mut self, t: chrono::DateTime<chrono::Utc>) -> Self {
        self.event_time = Some(t);
        self
    }

    /// Attaches a name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches consumer results.
    #[inline]
    pub fn with_results(mut self, results: &[ResultCode]) -> Self {
        self.results = Some(Arc::from(results));
        self
    }

    /// Creates a subscriber overflow notice.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Notice::new(NoticeKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic notice.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Notice::new(NoticeKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn sequence_numbers_increase() {
        let a = Notice::new(NoticeKind::ConveyorStarted);
        let b = Notice::new(NoticeKind::ConveyorStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn with_event_copies_time() {
        let ev = Event {
            event_time: DateTime::from_timestamp(42, 0).unwrap(),
            loop_counter: 7,
        };
        let n = Notice::new(NoticeKind::EventProduced)
            .with_event(&ev)
            .with_name("poller")
            .with_results(&[0, 1]);
        assert_eq!(n.event, Some(ev));
        assert_eq!(n.event_time, Some(ev.event_time));
        assert_eq!(n.name.as_deref(), Some("poller"));
        assert_eq!(n.results.as_deref(), Some(&[0, 1][..]));
    }
}
