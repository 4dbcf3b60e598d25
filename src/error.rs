//! Error types used by the conveyor runtime and its callables.
//!
//! This module defines two main error enums:
//!
//! - [`ConveyorError`] — errors raised by the conveyor itself (configuration,
//!   lifecycle, and the terminal reason a running pipeline came down).
//! - [`CallError`] — errors raised by a single producer or consumer call.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::core::Stage;
use crate::schedule::Event;

/// # Errors produced by the conveyor runtime.
///
/// Every running conveyor ends with exactly one of these (or `Ok` when the
/// terminal reason was [`ConveyorError::StopRequested`]).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConveyorError {
    /// Schedule parameters violate `interval > 0` and `offset < interval`.
    #[error("invalid schedule: interval={interval:?} offset={offset:?} (need interval > 0, offset < interval)")]
    InvalidSchedule {
        /// Configured tick spacing.
        interval: Duration,
        /// Configured tick offset.
        offset: Duration,
    },

    /// The builder was finished without a producer.
    #[error("conveyor has no producer")]
    MissingProducer,

    /// The builder was finished without any consumer.
    #[error("conveyor needs at least one consumer")]
    NoConsumers,

    /// `start()` was called on an instance that already started.
    #[error("conveyor already started; construct a new instance to run again")]
    AlreadyStarted,

    /// `join()` was called before `start()`.
    #[error("conveyor was never started")]
    NotStarted,

    /// `join()` was called a second time.
    #[error("conveyor worker already joined")]
    AlreadyJoined,

    /// The worker thread or its runtime could not be created.
    #[error("failed to launch conveyor worker: {0}")]
    Launch(#[from] std::io::Error),

    /// The producer failed; fatal to the whole conveyor.
    #[error("producer {producer:?} failed on event {event}: {error}")]
    ProducerFailed {
        /// Producer name.
        producer: String,
        /// Event being produced for.
        event: Event,
        /// Underlying call error.
        error: CallError,
    },

    /// A consumer failed; fatal to the whole conveyor.
    #[error("consumer {consumer:?} failed on event {event}: {error}")]
    ConsumerFailed {
        /// Name of the first consumer observed failing.
        consumer: String,
        /// Event being consumed.
        event: Event,
        /// Underlying call error.
        error: CallError,
    },

    /// Bounded queue was full under [`OverflowPolicy::Fail`](crate::OverflowPolicy::Fail).
    #[error("delivery queue full (capacity {capacity}); rejected event {event}")]
    QueueFull {
        /// Queue capacity.
        capacity: usize,
        /// Event of the rejected item.
        event: Event,
    },

    /// The watchdog observed a stop request. Treated as a normal shutdown.
    #[error("stop requested")]
    StopRequested,

    /// A stage returned without an error, which none of them should do.
    #[error("{stage} stage exited unexpectedly")]
    StageExited {
        /// Stage that exited.
        stage: Stage,
    },

    /// A stage panicked.
    #[error("{stage} stage panicked: {info}")]
    StagePanicked {
        /// Stage that panicked.
        stage: Stage,
        /// Panic payload rendered as text.
        info: String,
    },

    /// The worker thread panicked outside of any stage.
    #[error("conveyor worker thread panicked")]
    WorkerPanicked,
}

impl ConveyorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use conveyor::ConveyorError;
    ///
    /// assert_eq!(ConveyorError::StopRequested.as_label(), "conveyor_stop_requested");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConveyorError::InvalidSchedule { .. } => "conveyor_invalid_schedule",
            ConveyorError::MissingProducer => "conveyor_missing_producer",
            ConveyorError::NoConsumers => "conveyor_no_consumers",
            ConveyorError::AlreadyStarted => "conveyor_already_started",
            ConveyorError::NotStarted => "conveyor_not_started",
            ConveyorError::AlreadyJoined => "conveyor_already_joined",
            ConveyorError::Launch(_) => "conveyor_launch_failed",
            ConveyorError::ProducerFailed { .. } => "conveyor_producer_failed",
            ConveyorError::ConsumerFailed { .. } => "conveyor_consumer_failed",
            ConveyorError::QueueFull { .. } => "conveyor_queue_full",
            ConveyorError::StopRequested => "conveyor_stop_requested",
            ConveyorError::StageExited { .. } => "conveyor_stage_exited",
            ConveyorError::StagePanicked { .. } => "conveyor_stage_panicked",
            ConveyorError::WorkerPanicked => "conveyor_worker_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }

    /// Event that triggered the failure, if the error carries one.
    pub fn event(&self) -> Option<&Event> {
        match self {
            ConveyorError::ProducerFailed { event, .. }
            | ConveyorError::ConsumerFailed { event, .. }
            | ConveyorError::QueueFull { event, .. } => Some(event),
            _ => None,
        }
    }

    /// True for the watchdog's shutdown trigger, which is not a failure.
    pub fn is_stop(&self) -> bool {
        matches!(self, ConveyorError::StopRequested)
    }
}

/// # Errors produced by a producer or consumer call.
///
/// The conveyor never retries; any `CallError` is terminal for the stage that saw it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The call exceeded the configured per-call deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The call failed.
    #[error("call failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl CallError {
    /// Builds a [`CallError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use conveyor::CallError;
    ///
    /// let err = CallError::fail("device unreachable");
    /// assert_eq!(err.to_string(), "call failed: device unreachable");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        CallError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use conveyor::CallError;
    /// use std::time::Duration;
    ///
    /// let err = CallError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "call_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CallError::Timeout { .. } => "call_timeout",
            CallError::Fail { .. } => "call_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            CallError::Fail { error } => format!("error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn event(n: u64) -> Event {
        Event {
            event_time: DateTime::from_timestamp(105, 0).unwrap(),
            loop_counter: n,
        }
    }

    #[test]
    fn producer_failure_names_the_event() {
        let err = ConveyorError::ProducerFailed {
            producer: "poller".into(),
            event: event(3),
            error: CallError::fail("boom"),
        };
        let text = err.to_string();
        assert!(text.contains("\"poller\""), "{text}");
        assert!(text.contains("#3"), "{text}");
        assert!(text.contains("boom"), "{text}");
        assert_eq!(err.event().map(|e| e.loop_counter), Some(3));
        assert_eq!(err.as_label(), "conveyor_producer_failed");
    }

    #[test]
    fn only_stop_requested_is_a_stop() {
        assert!(ConveyorError::StopRequested.is_stop());
        assert!(!ConveyorError::NoConsumers.is_stop());
        assert!(ConveyorError::StopRequested.event().is_none());
    }

    #[test]
    fn call_error_messages() {
        let t = CallError::Timeout {
            timeout: Duration::from_millis(250),
        };
        assert_eq!(t.as_message(), "timeout: 250ms");
        assert_eq!(CallError::fail("x").as_message(), "error: x");
        assert_eq!(CallError::fail("x").as_label(), "call_failed");
    }
}
