//! # Conveyor: the lifecycle handle.
//!
//! `start()` hands the whole pipeline to a dedicated OS thread that owns its own
//! current-thread tokio runtime, then returns immediately.
//!
//! ```text
//! caller thread                         worker thread ("conveyor")
//! ─────────────                         ──────────────────────────
//! start() ─ latch, running = true ────► RunningGuard
//!         ─ thread::Builder::spawn        runtime = new_current_thread()
//!         ◄─ Ok(())                       runtime.block_on(supervise(..))
//! is_running() → true                        └─ stages run until first exit
//! stop()  ─ stop token ───────────────►   watchdog wakes, pipeline unwinds
//!                                         runtime dropped
//! is_running() → false ◄──────────────  RunningGuard::drop
//! join()  ◄─ Result<(), ConveyorError> ─ thread exit
//! ```
//!
//! ## Rules
//! - A conveyor starts at most once; a second `start()` is [`ConveyorError::AlreadyStarted`].
//! - `running` becomes `true` before `start()` returns and `false` only after
//!   every stage has ended and the runtime is gone.
//! - `stop()` is idempotent and never blocks.
//! - Dropping the handle requests a stop but does not wait for it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::broadcast;
use tracing::info;

use crate::core::builder::ConveyorBuilder;
use crate::core::config::ConveyorConfig;
use crate::core::state::{ConveyorState, RunningGuard};
use crate::core::supervisor::{Pipeline, supervise};
use crate::error::ConveyorError;
use crate::notices::{Bus, Notice};
use crate::schedule::Schedule;

type Worker = JoinHandle<Result<(), ConveyorError>>;

/// Periodic producer → queue → consumers pipeline running on its own thread.
///
/// Build one with [`Conveyor::builder`].
pub struct Conveyor<P: Send + Sync + 'static> {
    pipeline: Arc<Pipeline<P>>,
    state: Arc<ConveyorState>,
    bus: Bus,
    worker: Mutex<Option<Worker>>,
}

impl<P: Send + Sync + 'static> Conveyor<P> {
    /// Returns a builder for a conveyor with the given configuration.
    pub fn builder(cfg: ConveyorConfig) -> ConveyorBuilder<P> {
        ConveyorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(pipeline: Pipeline<P>) -> Self {
        let bus = Bus::new(pipeline.cfg.bus_capacity_clamped());
        Self {
            pipeline: Arc::new(pipeline),
            state: Arc::new(ConveyorState::new()),
            bus,
            worker: Mutex::new(None),
        }
    }

    /// Launches the pipeline on a dedicated worker thread and returns immediately.
    ///
    /// On return, [`is_running`](Self::is_running) is `true`.
    pub fn start(&self) -> Result<(), ConveyorError> {
        let mut worker = self.lock_worker();
        if !self.state.try_start() {
            return Err(ConveyorError::AlreadyStarted);
        }
        self.state.set_running(true);

        let pipeline = Arc::clone(&self.pipeline);
        let state = Arc::clone(&self.state);
        let bus = self.bus.clone();
        let spawned = thread::Builder::new()
            .name(self.pipeline.cfg.thread_name.clone())
            .spawn(move || run_worker(&pipeline, state, bus));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                info!(
                    thread = %self.pipeline.cfg.thread_name,
                    "conveyor: worker thread started"
                );
                Ok(())
            }
            Err(e) => {
                self.state.set_running(false);
                Err(ConveyorError::Launch(e))
            }
        }
    }

    /// Asks the pipeline to stop. Returns without waiting; idempotent.
    ///
    /// Calling it before [`start`](Self::start) makes the pipeline stop as soon as it starts.
    pub fn stop(&self) {
        if !self.state.is_stop_requested() {
            info!("conveyor: stop requested");
        }
        self.state.request_stop();
    }

    /// `true` from a successful `start()` until the pipeline has fully terminated.
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// `true` once [`stop`](Self::stop) was called or an OS signal was observed.
    pub fn is_stop_requested(&self) -> bool {
        self.state.is_stop_requested()
    }

    /// Waits for the worker thread and returns why the pipeline ended.
    ///
    /// - `Ok(())` after a requested stop;
    /// - the failing stage's error otherwise ([`ConveyorError::ProducerFailed`], ...).
    ///
    /// Can be called once per started conveyor.
    pub fn join(&self) -> Result<(), ConveyorError> {
        if !self.state.was_started() {
            return Err(ConveyorError::NotStarted);
        }
        let handle = self
            .lock_worker()
            .take()
            .ok_or(ConveyorError::AlreadyJoined)?;
        handle.join().unwrap_or(Err(ConveyorError::WorkerPanicked))
    }

    /// Receives every [`Notice`] published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.bus.subscribe()
    }

    /// Configuration this conveyor was built with.
    pub fn config(&self) -> &ConveyorConfig {
        &self.pipeline.cfg
    }

    /// Validated tick grid derived from `interval` and `offset`.
    pub fn schedule(&self) -> Schedule {
        self.pipeline.schedule
    }

    #[cfg(test)]
    pub(crate) fn pipeline_consumers(&self) -> &[crate::handlers::ConsumerRef<P>] {
        &self.pipeline.consumers
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: Send + Sync + 'static> Drop for Conveyor<P> {
    fn drop(&mut self) {
        self.state.request_stop();
    }
}

/// Worker thread body. `running` is cleared after the runtime is torn down.
fn run_worker<P: Send + Sync + 'static>(
    pipeline: &Pipeline<P>,
    state: Arc<ConveyorState>,
    bus: Bus,
) -> Result<(), ConveyorError> {
    let _running = RunningGuard(&state);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(supervise(pipeline, Arc::clone(&state), bus));
    drop(runtime);

    info!(ok = outcome.is_ok(), "conveyor: worker thread exiting");
    outcome
}
