use std::sync::Arc;

use crate::{
    core::{config::ConveyorConfig, conveyor::Conveyor, supervisor::Pipeline},
    error::ConveyorError,
    handlers::{ConsumerRef, ProducerRef},
    schedule::{ClockRef, SystemClock},
    subscribers::Subscribe,
};

/// Builder for a [`Conveyor`].
pub struct ConveyorBuilder<P: Send + Sync + 'static> {
    cfg: ConveyorConfig,
    producer: Option<ProducerRef<P>>,
    consumers: Vec<ConsumerRef<P>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    clock: ClockRef,
}

impl<P: Send + Sync + 'static> ConveyorBuilder<P> {
    /// Creates a new builder with the given configuration and the system clock.
    pub fn new(cfg: ConveyorConfig) -> Self {
        Self {
            cfg,
            producer: None,
            consumers: Vec::new(),
            subscribers: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the producer invoked once per tick. Replaces any previous one.
    pub fn with_producer(mut self, producer: ProducerRef<P>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Appends a consumer. Results are reported in registration order.
    pub fn with_consumer(mut self, consumer: ConsumerRef<P>) -> Self {
        self.consumers.push(consumer);
        self
    }

    /// Appends several consumers, keeping their order.
    pub fn with_consumers(mut self, consumers: impl IntoIterator<Item = ConsumerRef<P>>) -> Self {
        self.consumers.extend(consumers);
        self
    }

    /// Sets notice subscribers.
    ///
    /// Each subscriber gets its own bounded queue and worker task, so a slow
    /// one never holds up the pipeline.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the wall clock used to compute ticks.
    pub fn with_clock(mut self, clock: ClockRef) -> Self {
        self.clock = clock;
        self
    }

    /// Validates the setup and returns an unstarted conveyor.
    ///
    /// Fails with [`ConveyorError::InvalidSchedule`], [`ConveyorError::MissingProducer`]
    /// or [`ConveyorError::NoConsumers`].
    pub fn build(self) -> Result<Conveyor<P>, ConveyorError> {
        let schedule = self.cfg.schedule()?;
        let producer = self.producer.ok_or(ConveyorError::MissingProducer)?;
        if self.consumers.is_empty() {
            return Err(ConveyorError::NoConsumers);
        }

        Ok(Conveyor::new_internal(Pipeline {
            cfg: self.cfg,
            schedule,
            producer,
            consumers: Arc::from(self.consumers),
            subscribers: self.subscribers,
            clock: self.clock,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::CallError;
    use crate::handlers::{Consume, ConsumeFn, ProduceFn, ResultCode};
    use crate::schedule::Event;

    fn producer() -> ProducerRef<u8> {
        ProduceFn::arc("p", |_ev: Event| async { Ok::<_, CallError>(1u8) })
    }

    fn consumer(name: &'static str) -> ConsumerRef<u8> {
        ConsumeFn::arc(name, |_ev: Event, _p: Arc<u8>| async {
            Ok::<ResultCode, CallError>(0)
        })
    }

    #[test]
    fn rejects_missing_parts() {
        let no_producer = ConveyorBuilder::<u8>::new(ConveyorConfig::default())
            .with_consumer(consumer("c"))
            .build();
        assert!(matches!(no_producer, Err(ConveyorError::MissingProducer)));

        let no_consumers = ConveyorBuilder::new(ConveyorConfig::default())
            .with_producer(producer())
            .build();
        assert!(matches!(no_consumers, Err(ConveyorError::NoConsumers)));
    }

    #[test]
    fn rejects_offset_not_below_interval() {
        let cfg = ConveyorConfig {
            interval: Duration::from_secs(5),
            offset: Duration::from_secs(5),
            ..ConveyorConfig::default()
        };
        let res = ConveyorBuilder::new(cfg)
            .with_producer(producer())
            .with_consumer(consumer("c"))
            .build();
        assert!(matches!(res, Err(ConveyorError::InvalidSchedule { .. })));
    }

    #[test]
    fn builds_with_consumers_in_order() {
        let c = ConveyorBuilder::new(ConveyorConfig::default())
            .with_producer(producer())
            .with_consumers(vec![consumer("a"), consumer("b")])
            .with_consumer(consumer("c"))
            .build()
            .unwrap();
        let names: Vec<&str> = c.pipeline_consumers().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!c.is_running());
        assert_eq!(c.schedule().interval(), Duration::from_secs(30));
    }
}
