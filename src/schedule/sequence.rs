//! # Event sequence: the conveyor's timer.
//!
//! Turns the tick grid into an infinite series of realized [`Event`]s.
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► t_event = next_tick(schedule, clock.now())
//!   ├─► t_event <= last emitted? ─► t_event = next_tick(schedule, last)
//!   ├─► delta   = t_event - clock.now()
//!   ├─► delta < 0 ─► warn, publish TickSkipped, sleep(skew_grace), continue
//!   └─► sleep(delta) ─► emit Event { t_event, loop_counter } ─► loop_counter += 1
//! }
//! ```
//!
//! ## Rules
//! - Emitted events have strictly increasing `event_time` and `loop_counter`, even
//!   when the wall clock reads slightly behind the monotonic sleep on wake-up.
//! - `loop_counter` starts at 0 and has no gaps; skipped ticks never consume one.
//! - The sequence never ends on its own.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::Stream;
use tracing::{debug, warn};

use crate::notices::{Bus, Notice, NoticeKind};
use crate::schedule::clock::{ClockRef, Schedule};

/// Realized occurrence of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    /// Scheduled wall-clock time of the tick (UTC).
    pub event_time: DateTime<Utc>,
    /// Ordinal of the realized tick, starting at 0.
    pub loop_counter: u64,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} @ {}",
            self.loop_counter,
            self.event_time.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// Lazy, infinite, non-restartable sequence of [`Event`]s.
pub struct EventSequence {
    schedule: Schedule,
    clock: ClockRef,
    skew_grace: Duration,
    loop_counter: u64,
    last: Option<DateTime<Utc>>,
    bus: Bus,
}

impl EventSequence {
    /// Creates a sequence whose first emitted event has `loop_counter == 0`.
    ///
    /// `skew_grace` is the pause taken after a skipped tick before trying again.
    pub fn new(schedule: Schedule, clock: ClockRef, skew_grace: Duration, bus: Bus) -> Self {
        Self {
            schedule,
            clock,
            skew_grace,
            loop_counter: 0,
            last: None,
            bus,
        }
    }

    /// Counter the next emitted event will carry.
    pub fn loop_counter(&self) -> u64 {
        self.loop_counter
    }

    /// Sleeps until the next tick and returns its event.
    pub async fn next_event(&mut self) -> Event {
        loop {
            let mut t_event = self.schedule.next_tick(self.clock.now());
            if let Some(last) = self.last.filter(|last| t_event <= *last) {
                t_event = self.schedule.next_tick(last);
            }
            let delta = t_event - self.clock.now();

            let Ok(wait) = delta.to_std() else {
                warn!(
                    event_time = %t_event,
                    behind_ms = -delta.num_milliseconds(),
                    "scheduler: skipping tick already in the past"
                );
                self.bus.publish(
                    Notice::new(NoticeKind::TickSkipped)
                        .with_event_time(t_event)
                        .with_reason(format!("{}ms behind", -delta.num_milliseconds())),
                );
                tokio::time::sleep(self.skew_grace).await;
                continue;
            };

            debug!(
                event_time = %t_event,
                loop_counter = self.loop_counter,
                wait_ms = wait.as_millis() as u64,
                "scheduler: next event"
            );
            tokio::time::sleep(wait).await;

            let event = Event {
                event_time: t_event,
                loop_counter: self.loop_counter,
            };
            self.loop_counter += 1;
            self.last = Some(t_event);
            return event;
        }
    }

    /// Adapts the sequence into a [`Stream`] that never yields `None`.
    pub fn into_stream(self) -> impl Stream<Item = Event> + Send {
        futures::stream::unfold(self, |mut seq| async move {
            let event = seq.next_event().await;
            Some((event, seq))
        })
    }
}
