//! # Consumption stage: fan-out and join.
//!
//! ```text
//! loop {
//!   ├─► item = queue.pop()                      (waits while empty)
//!   ├─► fan_out(consumers, item)
//!   │       ├──► c1.consume(event, payload) ┐
//!   │       ├──► c2.consume(event, payload) ├─ polled concurrently on this task
//!   │       └──► cN.consume(event, payload) ┘
//!   │       ├─ all Ok  → Vec<ResultCode> in registration order
//!   │       └─ first Err → remaining calls dropped → ConsumerFailed
//!   └─► log results, publish ConsumersCompleted
//! }
//! ```
//!
//! ## Rules
//! - Every consumer of an item gets the same `Event` and the same `Arc<P>`.
//! - The next item is not popped before every consumer of the current one returned.
//! - On the first failure, sibling calls still in flight are cancelled (dropped);
//!   nothing outlives the join.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::info;

use crate::core::queue::{DeliveryQueue, QueueItem};
use crate::core::runner::call_with_deadline;
use crate::error::ConveyorError;
use crate::handlers::{ConsumerRef, ResultCode};
use crate::notices::{Bus, Notice, NoticeKind};

pub(crate) struct ConsumptionStage<P: Send + Sync + 'static> {
    pub(crate) consumers: Arc<[ConsumerRef<P>]>,
    pub(crate) queue: Arc<DeliveryQueue<QueueItem<P>>>,
    pub(crate) deadline: Option<Duration>,
    pub(crate) bus: Bus,
}

impl<P: Send + Sync + 'static> ConsumptionStage<P> {
    /// Runs until a consumer fails.
    pub(crate) async fn run(self) -> Result<Infallible, ConveyorError> {
        loop {
            let item = self.queue.pop().await;
            let results = fan_out(&self.consumers, &item, self.deadline).await?;

            info!(
                event = %item.event,
                results = ?results,
                "consumption: consumers completed"
            );
            self.bus.publish(
                Notice::new(NoticeKind::ConsumersCompleted)
                    .with_event(&item.event)
                    .with_results(&results),
            );
        }
    }
}

/// Calls every consumer with `item` concurrently and joins the results.
///
/// Fails fast with the first error observed; the other calls are dropped.
pub(crate) async fn fan_out<P: Send + Sync + 'static>(
    consumers: &[ConsumerRef<P>],
    item: &QueueItem<P>,
    deadline: Option<Duration>,
) -> Result<Vec<ResultCode>, ConveyorError> {
    let calls = consumers.iter().map(|consumer| {
        let event = item.event;
        let payload = Arc::clone(&item.payload);
        async move {
            call_with_deadline(consumer.consume(event, payload), deadline)
                .await
                .map_err(|error| ConveyorError::ConsumerFailed {
                    consumer: consumer.name().to_string(),
                    event,
                    error,
                })
        }
    });
    try_join_all(calls).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::DateTime;

    use super::*;
    use crate::error::CallError;
    use crate::handlers::ConsumeFn;
    use crate::schedule::Event;

    fn item(n: u64, payload: &str) -> QueueItem<String> {
        QueueItem {
            event: Event {
                event_time: DateTime::from_timestamp(100 + n as i64 * 5, 0).unwrap(),
                loop_counter: n,
            },
            payload: Arc::new(payload.to_string()),
        }
    }

    type Seen = Arc<Mutex<Vec<(usize, Event, Arc<String>)>>>;

    fn recording(idx: usize, seen: Seen, delay_ms: u64) -> ConsumerRef<String> {
        ConsumeFn::arc(format!("rec-{idx}"), move |ev: Event, p: Arc<String>| {
            let seen = Arc::clone(&seen);
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                seen.lock().unwrap().push((idx, ev, p));
                Ok::<_, CallError>(idx as ResultCode)
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn every_consumer_sees_the_same_item_and_results_keep_registration_order() {
        let seen: Seen = Arc::default();
        // slower consumers first so completion order differs from registration order
        let consumers: Vec<ConsumerRef<String>> = (0..4)
            .map(|i| recording(i, Arc::clone(&seen), 40 - i as u64 * 10))
            .collect();
        let it = item(7, "reading");

        let results = fan_out(&consumers, &it, None).await.unwrap();

        assert_eq!(results, vec![0, 1, 2, 3]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen.iter().map(|(i, _, _)| *i).collect::<Vec<_>>(),
            vec![3, 2, 1, 0]
        );
        for (_, ev, payload) in seen.iter() {
            assert_eq!(*ev, it.event);
            assert!(Arc::ptr_eq(payload, &it.payload));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_cancels_siblings() {
        let finished = Arc::new(AtomicBool::new(false));
        let slow: ConsumerRef<String> = ConsumeFn::arc("slow", {
            let finished = Arc::clone(&finished);
            move |_ev: Event, _p: Arc<String>| {
                let finished = Arc::clone(&finished);
                async move {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    finished.store(true, Ordering::SeqCst);
                    Ok::<_, CallError>(0)
                }
            }
        });
        let broken: ConsumerRef<String> =
            ConsumeFn::arc("broken", |_ev: Event, _p: Arc<String>| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Err::<ResultCode, _>(CallError::fail("disk full"))
            });

        let started = tokio::time::Instant::now();
        let err = fan_out(&[slow, broken], &item(3, "x"), None)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(1));
        match err {
            ConveyorError::ConsumerFailed {
                consumer, event, ..
            } => {
                assert_eq!(consumer, "broken");
                assert_eq!(event.loop_counter, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_hung_consumer_into_failure() {
        let hung: ConsumerRef<String> =
            ConsumeFn::arc("hung", |_ev: Event, _p: Arc<String>| async move {
                std::future::pending::<()>().await;
                Ok::<_, CallError>(0)
            });
        let err = fan_out(&[hung], &item(0, "x"), Some(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConveyorError::ConsumerFailed {
                error: CallError::Timeout { .. },
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stage_drains_in_fifo_order() {
        let seen: Seen = Arc::default();
        let queue = Arc::new(DeliveryQueue::unbounded());
        for n in 0..5 {
            queue.push(item(n, "p")).await.unwrap();
        }
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let stage = ConsumptionStage {
            consumers: Arc::from(vec![recording(0, Arc::clone(&seen), 1)]),
            queue: Arc::clone(&queue),
            deadline: None,
            bus,
        };

        let _ = tokio::time::timeout(Duration::from_secs(1), stage.run()).await;

        let order: Vec<u64> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|(_, ev, _)| ev.loop_counter)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);

        let completed = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|n| n.kind == NoticeKind::ConsumersCompleted)
            .count();
        assert_eq!(completed, 5);
    }
}
