//! # Supervisor: runs the three stages and tears down on the first exit.
//!
//! Runs inside the worker thread's current-thread runtime.
//!
//! ## High-level architecture
//! ```text
//! supervise(pipeline):
//!   - subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Notice)
//!   - publish ConveyorStarted
//!
//! Spawn stages (one JoinSet, shared DeliveryQueue + ConveyorState):
//!   ProductionStage ──► queue ──► ConsumptionStage
//!   Watchdog ◄── stop token / OS signal
//!
//! Join-on-first-exit:
//!   set.join_next_with_id()  ─► (stage, reason)
//!        ├─ StopRequested   → info!, Ok(())
//!        └─ anything else   → error!, publish StageFailed, Err(reason)
//!   set.abort_all() + drain  (no sibling outlives the supervisor)
//!
//! Teardown:
//!   publish ConveyorStopped ─► stop listener ─► flush subscribers
//!                                                (bounded by subscriber_grace,
//!                                                 then remaining workers aborted)
//! ```
//!
//! A stage never ends without a reason: each returns `Result<Infallible, ConveyorError>`,
//! so the join result is always the error that brought the pipeline down.

use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::config::ConveyorConfig;
use crate::core::consumption::ConsumptionStage;
use crate::core::production::ProductionStage;
use crate::core::queue::DeliveryQueue;
use crate::core::stage::Stage;
use crate::core::state::ConveyorState;
use crate::core::watchdog::Watchdog;
use crate::error::ConveyorError;
use crate::handlers::{ConsumerRef, ProducerRef};
use crate::notices::{Bus, Notice, NoticeKind};
use crate::schedule::{ClockRef, EventSequence, Schedule};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Everything a conveyor needs to run, fixed at build time.
pub(crate) struct Pipeline<P: Send + Sync + 'static> {
    pub(crate) cfg: ConveyorConfig,
    pub(crate) schedule: Schedule,
    pub(crate) producer: ProducerRef<P>,
    pub(crate) consumers: Arc<[ConsumerRef<P>]>,
    pub(crate) subscribers: Vec<Arc<dyn Subscribe>>,
    pub(crate) clock: ClockRef,
}

type StageSet = JoinSet<ConveyorError>;

/// Runs the pipeline until its first stage exits.
///
/// Returns `Ok(())` when the exit was a requested stop, the stage's error otherwise.
pub(crate) async fn supervise<P: Send + Sync + 'static>(
    pipeline: &Pipeline<P>,
    state: Arc<ConveyorState>,
    bus: Bus,
) -> Result<(), ConveyorError> {
    let listener_stop = CancellationToken::new();
    let listener = tokio::spawn(subscriber_listener(
        bus.subscribe(),
        SubscriberSet::new(pipeline.subscribers.clone(), bus.clone()),
        listener_stop.clone(),
        pipeline.cfg.subscriber_grace,
    ));

    info!(
        interval = ?pipeline.schedule.interval(),
        offset = ?pipeline.schedule.offset(),
        producer = pipeline.producer.name(),
        consumers = pipeline.consumers.len(),
        "conveyor: pipeline starting"
    );
    bus.publish(Notice::new(NoticeKind::ConveyorStarted));

    let mut set = StageSet::new();
    let stages = spawn_stages(&mut set, pipeline, state, &bus);
    let (stage, reason) = first_exit(&mut set, &stages).await;

    set.abort_all();
    while set.join_next().await.is_some() {}

    let outcome = report(stage, reason, &bus);

    listener_stop.cancel();
    let _ = listener.await;
    outcome
}

/// Spawns production, consumption and watchdog; returns task id → stage.
fn spawn_stages<P: Send + Sync + 'static>(
    set: &mut StageSet,
    pipeline: &Pipeline<P>,
    state: Arc<ConveyorState>,
    bus: &Bus,
) -> HashMap<Id, Stage> {
    let cfg = &pipeline.cfg;
    let queue = Arc::new(DeliveryQueue::new(cfg.queue_limit(), cfg.overflow));

    let production = ProductionStage {
        events: EventSequence::new(
            pipeline.schedule,
            Arc::clone(&pipeline.clock),
            cfg.skew_grace,
            bus.clone(),
        ),
        producer: Arc::clone(&pipeline.producer),
        queue: Arc::clone(&queue),
        deadline: cfg.call_deadline(),
        bus: bus.clone(),
    };
    let consumption = ConsumptionStage {
        consumers: Arc::clone(&pipeline.consumers),
        queue,
        deadline: cfg.call_deadline(),
        bus: bus.clone(),
    };
    let watchdog = Watchdog {
        state,
        poll: cfg.watchdog_poll_clamped(),
        os_signals: cfg.handle_os_signals,
        bus: bus.clone(),
    };

    let mut stages = HashMap::with_capacity(3);
    stages.insert(spawn_stage(set, production.run()), Stage::Production);
    stages.insert(spawn_stage(set, consumption.run()), Stage::Consumption);
    stages.insert(spawn_stage(set, watchdog.run()), Stage::Watchdog);
    stages
}

fn spawn_stage<F>(set: &mut StageSet, fut: F) -> Id
where
    F: Future<Output = Result<Infallible, ConveyorError>> + Send + 'static,
{
    set.spawn(async move {
        let Err(reason) = fut.await;
        reason
    })
    .id()
}

/// Waits for the first stage to exit, by error or by panic.
async fn first_exit(set: &mut StageSet, stages: &HashMap<Id, Stage>) -> (Stage, ConveyorError) {
    let stage_of = |id: Id| stages.get(&id).copied().unwrap_or(Stage::Watchdog);

    match set.join_next_with_id().await {
        Some(Ok((id, reason))) => (stage_of(id), reason),
        Some(Err(join_err)) => {
            let stage = stage_of(join_err.id());
            if join_err.is_panic() {
                let info = panic_message(join_err.into_panic().as_ref());
                (stage, ConveyorError::StagePanicked { stage, info })
            } else {
                (stage, ConveyorError::StageExited { stage })
            }
        }
        // three tasks were just spawned
        None => (Stage::Watchdog, ConveyorError::StopRequested),
    }
}

/// Logs the terminal reason, publishes it, and maps a requested stop to `Ok`.
fn report(stage: Stage, reason: ConveyorError, bus: &Bus) -> Result<(), ConveyorError> {
    if reason.is_stop() {
        info!(%stage, "conveyor: stopped on request");
        bus.publish(Notice::new(NoticeKind::ConveyorStopped).with_reason(reason.to_string()));
        return Ok(());
    }

    match reason.event() {
        Some(event) => error!(
            %stage,
            %event,
            label = reason.as_label(),
            error = %reason,
            "conveyor: stage failed, stopping"
        ),
        None => error!(
            %stage,
            label = reason.as_label(),
            error = %reason,
            "conveyor: stage failed, stopping"
        ),
    }

    let mut failed = Notice::new(NoticeKind::StageFailed)
        .with_stage(stage)
        .with_reason(reason.to_string());
    if let Some(event) = reason.event() {
        failed = failed.with_event(event);
    }
    bus.publish(failed);
    bus.publish(Notice::new(NoticeKind::ConveyorStopped).with_reason(reason.to_string()));
    Err(reason)
}

/// Forwards bus notices to the subscriber set until `stop`, then drains and
/// flushes for at most `grace`.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Notice>,
    set: SubscriberSet,
    stop: CancellationToken,
    grace: Duration,
) {
    loop {
        tokio::select! {
            biased;
            res = rx.recv() => match res {
                Ok(notice) => set.emit(&notice),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => break,
        }
    }
    while let Ok(notice) = rx.try_recv() {
        set.emit(&notice);
    }
    if !set.shutdown_within(grace).await {
        warn!(?grace, "conveyor: subscribers still busy after grace, aborted");
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::error::CallError;
    use crate::handlers::{ConsumeFn, ProduceFn, ResultCode};
    use crate::schedule::Event;
    use crate::schedule::test_clocks::PausedClock;

    fn pipeline(producer: ProducerRef<u64>, consumers: Vec<ConsumerRef<u64>>) -> Pipeline<u64> {
        let cfg = ConveyorConfig {
            interval: Duration::from_secs(5),
            ..ConveyorConfig::default()
        };
        Pipeline {
            schedule: cfg.schedule().unwrap(),
            cfg,
            producer,
            consumers: Arc::from(consumers),
            subscribers: Vec::new(),
            clock: Arc::new(PausedClock::at(100)),
        }
    }

    fn counter_producer() -> ProducerRef<u64> {
        ProduceFn::arc("counter", |ev: Event| async move {
            Ok::<_, CallError>(ev.loop_counter)
        })
    }

    fn sink(seen: Arc<AtomicU64>) -> ConsumerRef<u64> {
        ConsumeFn::arc("sink", move |_ev: Event, _p: Arc<u64>| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok::<ResultCode, CallError>(0)
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn stop_request_is_a_clean_exit() {
        let seen = Arc::new(AtomicU64::new(0));
        let pipe = pipeline(counter_producer(), vec![sink(Arc::clone(&seen))]);
        let state = Arc::new(ConveyorState::new());
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();

        let stopper = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                // ticks at 105, 110, 115 → three items before the stop
                tokio::time::sleep(Duration::from_secs(17)).await;
                state.request_stop();
            }
        });

        let outcome = supervise(&pipe, state, bus).await;
        stopper.await.unwrap();

        assert!(outcome.is_ok(), "{outcome:?}");
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        let kinds: Vec<NoticeKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|n| n.kind)
            .collect();
        assert_eq!(kinds.first(), Some(&NoticeKind::ConveyorStarted));
        assert_eq!(kinds.last(), Some(&NoticeKind::ConveyorStopped));
        assert!(kinds.contains(&NoticeKind::StopRequested));
        assert!(!kinds.contains(&NoticeKind::StageFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn producer_failure_brings_everything_down() {
        let seen = Arc::new(AtomicU64::new(0));
        let producer: ProducerRef<u64> = ProduceFn::arc("flaky", |ev: Event| async move {
            if ev.loop_counter == 3 {
                return Err(CallError::fail("injected"));
            }
            Ok(ev.loop_counter)
        });
        let pipe = pipeline(producer, vec![sink(Arc::clone(&seen))]);
        let bus = Bus::new(256);
        let mut rx = bus.subscribe();

        let err = supervise(&pipe, Arc::new(ConveyorState::new()), bus)
            .await
            .unwrap_err();

        assert_eq!(err.event().map(|e| e.loop_counter), Some(3));
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        let failed = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|n| n.kind == NoticeKind::StageFailed)
            .unwrap();
        assert_eq!(failed.stage, Some(Stage::Production));
        assert_eq!(failed.event.map(|e| e.loop_counter), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn consumer_panic_is_reported_as_stage_panic() {
        let panicking: ConsumerRef<u64> =
            ConsumeFn::arc("panicky", |_ev: Event, _p: Arc<u64>| async move {
                if true {
                    panic!("consumer exploded");
                }
                Ok::<ResultCode, CallError>(0)
            });
        let pipe = pipeline(counter_producer(), vec![panicking]);

        let err = supervise(&pipe, Arc::new(ConveyorState::new()), Bus::new(64))
            .await
            .unwrap_err();

        match err {
            ConveyorError::StagePanicked { stage, info } => {
                assert_eq!(stage, Stage::Consumption);
                assert_eq!(info, "consumer exploded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    struct Sluggish;

    #[async_trait::async_trait]
    impl Subscribe for Sluggish {
        async fn on_notice(&self, _n: &Notice) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        fn name(&self) -> &'static str {
            "sluggish"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_subscriber_does_not_hold_the_pipeline() {
        let seen = Arc::new(AtomicU64::new(0));
        let mut pipe = pipeline(counter_producer(), vec![sink(Arc::clone(&seen))]);
        pipe.subscribers = vec![Arc::new(Sluggish)];
        let grace = pipe.cfg.subscriber_grace;
        let state = Arc::new(ConveyorState::new());

        let stopper = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                tokio::time::sleep(Duration::from_secs(7)).await;
                state.request_stop();
            }
        });

        let started = tokio::time::Instant::now();
        let outcome = supervise(&pipe, Arc::clone(&state), Bus::new(64)).await;
        stopper.await.unwrap();

        assert!(outcome.is_ok(), "{outcome:?}");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        // stop at 7s, then at most one grace for the subscriber drain
        let took = started.elapsed();
        assert!(took < Duration::from_secs(7) + grace + Duration::from_millis(100), "{took:?}");
    }

    #[test]
    fn panic_payloads_render() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
