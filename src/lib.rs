//! # conveyor
//!
//! **Conveyor** runs a periodic producer → queue → consumers pipeline on a
//! dedicated worker thread.
//!
//! A producer is called once per wall-clock tick (a boundary of
//! `interval` shifted by `offset`). Each payload is queued and handed, in FIFO
//! order, to every registered consumer concurrently. Any failure stops the
//! whole pipeline; there is no retry.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  caller thread                     worker thread (current-thread tokio runtime)
//! ┌──────────────┐  start()   ┌───────────────────────────────────────────────────┐
//! │   Conveyor   │ ─────────► │  supervise()  (JoinSet, first exit wins)          │
//! │ is_running() │            │                                                   │
//! │ stop()       │            │  ┌───────────────┐  ┌──────────┐  ┌─────────────┐ │
//! │ join()       │            │  │ Production    │  │ Delivery │  │ Consumption │ │
//! │ subscribe()  │            │  │ EventSequence ├─►│  Queue   ├─►│ fan_out()   │ │
//! └──────┬───────┘            │  │ → producer    │  │  (FIFO)  │  │ → consumers │ │
//!        │ stop token         │  └───────────────┘  └──────────┘  └─────────────┘ │
//!        └──────────────────► │  ┌───────────────┐                                │
//!                             │  │ Watchdog      │ stop token / OS signal         │
//!                             │  └───────────────┘                                │
//!                             └──────────────────────┬────────────────────────────┘
//!                                                    ▼ publish(Notice)
//!                              ┌──────────────────────────────────────┐
//!                              │   Bus (broadcast) ─► SubscriberSet   │
//!                              └──────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ── start() ──► Running ── first stage exit ──► Stopped (terminal)
//!
//! first stage exit:
//!   ├─ Watchdog: stop requested ─► info!, join() → Ok(())
//!   ├─ Production: producer failed / queue full ─► error!, join() → Err
//!   └─ Consumption: consumer failed ─► error!, join() → Err
//! then: siblings aborted, ConveyorStopped published, runtime dropped,
//!       is_running() → false
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                       |
//! |-------------------|----------------------------------------------------------|------------------------------------------|
//! | **Lifecycle**     | Start, stop and join a pipeline on its own thread.       | [`Conveyor`], [`ConveyorBuilder`]        |
//! | **Schedule**      | Wall-clock tick math and the event sequence.             | [`Schedule`], [`next_tick`], [`Event`]   |
//! | **Handlers**      | Producer and consumer contracts, closure adapters.       | [`Produce`], [`Consume`], [`ProduceFn`]  |
//! | **Queue**         | FIFO hand-off, optionally bounded.                       | [`DeliveryQueue`], [`OverflowPolicy`]    |
//! | **Observability** | Notices on a broadcast bus, pluggable subscribers.       | [`Notice`], [`Subscribe`]                |
//! | **Errors**        | Typed terminal errors and per-call errors.               | [`ConveyorError`], [`CallError`]         |
//! | **Configuration** | Centralized settings.                                    | [`ConveyorConfig`]                       |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use conveyor::{CallError, ConsumeFn, ConsumerRef, Conveyor, ConveyorConfig, Event, ProduceFn, ProducerRef};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = ConveyorConfig {
//!         interval: Duration::from_secs(5),
//!         ..ConveyorConfig::default()
//!     };
//!
//!     let sensor: ProducerRef<f64> = ProduceFn::arc("sensor", |ev: Event| async move {
//!         Ok::<_, CallError>(ev.loop_counter as f64 * 0.5)
//!     });
//!     let printer: ConsumerRef<f64> = ConsumeFn::arc("printer", |ev: Event, v: Arc<f64>| async move {
//!         println!("{ev}: {v}");
//!         Ok::<_, CallError>(0)
//!     });
//!
//!     let conveyor = Conveyor::builder(cfg)
//!         .with_producer(sensor)
//!         .with_consumer(printer)
//!         .build()?;
//!
//!     conveyor.start()?;
//!     std::thread::sleep(Duration::from_secs(12));
//!     conveyor.stop();
//!     conveyor.join()?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod handlers;
mod notices;
mod policies;
mod schedule;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Conveyor, ConveyorBuilder, ConveyorConfig, DeliveryQueue, Pushed, QueueItem, Stage};
pub use error::{CallError, ConveyorError};
pub use handlers::{Consume, ConsumeFn, ConsumerRef, Produce, ProduceFn, ProducerRef, ResultCode};
pub use notices::{Bus, Notice, NoticeKind};
pub use policies::OverflowPolicy;
pub use schedule::{Clock, ClockRef, Event, EventSequence, Schedule, SystemClock, next_tick};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
