//! # Production stage.
//!
//! Drives the [`EventSequence`] one event at a time:
//!
//! ```text
//! loop {
//!   ├─► event   = events.next_event()           (sleeps to the wall-clock tick)
//!   ├─► payload = producer.produce(event)       (optional deadline)
//!   │       └─ Err ──► return ProducerFailed { producer, event, error }
//!   ├─► publish EventProduced
//!   └─► queue.push((event, payload))
//!           ├─ Queued        → continue
//!           ├─ Displaced(old)→ warn, publish QueueOverflow, continue
//!           └─ Rejected      → return QueueFull
//! }
//! ```
//!
//! Calls are sequential, never pipelined: a producer call that outlives the
//! next tick makes that tick start late (or be skipped if already past).

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::queue::{DeliveryQueue, Pushed, QueueItem};
use crate::core::runner::call_with_deadline;
use crate::error::ConveyorError;
use crate::handlers::ProducerRef;
use crate::notices::{Bus, Notice, NoticeKind};
use crate::schedule::EventSequence;

pub(crate) struct ProductionStage<P: Send + Sync + 'static> {
    pub(crate) events: EventSequence,
    pub(crate) producer: ProducerRef<P>,
    pub(crate) queue: Arc<DeliveryQueue<QueueItem<P>>>,
    pub(crate) deadline: Option<Duration>,
    pub(crate) bus: Bus,
}

impl<P: Send + Sync + 'static> ProductionStage<P> {
    /// Runs until the producer fails or the queue rejects an item.
    pub(crate) async fn run(mut self) -> Result<Infallible, ConveyorError> {
        let name = self.producer.name().to_string();
        debug!(producer = %name, "production: started");

        loop {
            let event = self.events.next_event().await;
            debug!(%event, "production: event due");

            let payload = call_with_deadline(self.producer.produce(event), self.deadline)
                .await
                .map_err(|error| ConveyorError::ProducerFailed {
                    producer: name.clone(),
                    event,
                    error,
                })?;
            self.bus.publish(
                Notice::new(NoticeKind::EventProduced)
                    .with_event(&event)
                    .with_name(name.as_str()),
            );

            let item = QueueItem {
                event,
                payload: Arc::new(payload),
            };
            match self.queue.push(item).await {
                Ok(Pushed::Queued) => {}
                Ok(Pushed::Displaced(old)) => {
                    warn!(dropped = %old.event, "production: queue full, dropped oldest item");
                    self.bus
                        .publish(Notice::new(NoticeKind::QueueOverflow).with_event(&old.event));
                }
                Err(rejected) => {
                    return Err(ConveyorError::QueueFull {
                        capacity: self.queue.capacity().unwrap_or_default(),
                        event: rejected.event,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use chrono::DateTime;

    use super::*;
    use crate::error::CallError;
    use crate::handlers::ProduceFn;
    use crate::policies::OverflowPolicy;
    use crate::schedule::test_clocks::PausedClock;
    use crate::schedule::{Event, Schedule};

    fn stage(
        producer: ProducerRef<u64>,
        queue: Arc<DeliveryQueue<QueueItem<u64>>>,
        bus: Bus,
    ) -> ProductionStage<u64> {
        let schedule = Schedule::new(Duration::from_secs(5), Duration::ZERO).unwrap();
        let events = EventSequence::new(
            schedule,
            Arc::new(PausedClock::at(100)),
            Duration::from_millis(200),
            bus.clone(),
        );
        ProductionStage {
            events,
            producer,
            queue,
            deadline: None,
            bus,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn producer_failure_stops_at_the_failing_event() {
        let calls = Arc::new(AtomicU64::new(0));
        let producer: ProducerRef<u64> = ProduceFn::arc("flaky", {
            let calls = Arc::clone(&calls);
            move |ev: Event| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if ev.loop_counter == 3 {
                        return Err(CallError::fail("injected"));
                    }
                    Ok::<_, CallError>(ev.loop_counter * 10)
                }
            }
        });
        let queue = Arc::new(DeliveryQueue::unbounded());
        let bus = Bus::new(64);

        let err = stage(producer, Arc::clone(&queue), bus)
            .run()
            .await
            .unwrap_err();

        match err {
            ConveyorError::ProducerFailed {
                producer, event, ..
            } => {
                assert_eq!(producer, "flaky");
                assert_eq!(event.loop_counter, 3);
                assert_eq!(event.event_time, DateTime::from_timestamp(120, 0).unwrap());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(queue.len(), 3);
        for n in 0..3u64 {
            let item = queue.pop().await;
            assert_eq!(item.event.loop_counter, n);
            assert_eq!(*item.payload, n * 10);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_with_fail_policy_is_terminal() {
        let producer: ProducerRef<u64> = ProduceFn::arc("steady", |ev: Event| async move {
            Ok::<_, CallError>(ev.loop_counter)
        });
        let queue = Arc::new(DeliveryQueue::new(Some(2), OverflowPolicy::Fail));

        let err = stage(producer, Arc::clone(&queue), Bus::new(64))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConveyorError::QueueFull { capacity: 2, event } if event.loop_counter == 2
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_oldest_publishes_overflow() {
        let producer: ProducerRef<u64> = ProduceFn::arc("steady", |ev: Event| async move {
            Ok::<_, CallError>(ev.loop_counter)
        });
        let queue = Arc::new(DeliveryQueue::new(Some(1), OverflowPolicy::DropOldest));
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let run = stage(producer, Arc::clone(&queue), bus).run();
        // 100s → ticks at 105, 110, 115; stop after the third push
        let _ = tokio::time::timeout(Duration::from_millis(16_000), run).await;

        assert_eq!(queue.pop().await.event.loop_counter, 2);

        let dropped: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|n| n.kind == NoticeKind::QueueOverflow)
            .filter_map(|n| n.event.map(|e| e.loop_counter))
            .collect();
        assert_eq!(dropped, vec![0, 1]);
    }
}
