//! Toy conveyor: a producer that formats the event, one consumer that prints it.
//!
//! Run with:
//! ```text
//! RUST_LOG=debug cargo run --example toy_conveyor --features logging
//! ```
//! Stop with Ctrl-C; the main thread exits once the conveyor is no longer running.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use conveyor::{
    CallError, ConsumeFn, ConsumerRef, Conveyor, ConveyorConfig, Event, LogWriter, ProduceFn,
    ProducerRef, ResultCode, Subscribe,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn setup_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_thread_names(true))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let producer: ProducerRef<String> = ProduceFn::arc("toy-producer", |event: Event| async move {
        let payload = format!("producing toy event: {event}, wall clock: {}", Utc::now());
        println!("<<< producer: {payload}");
        Ok::<_, CallError>(payload)
    });
    let consumer: ConsumerRef<String> =
        ConsumeFn::arc("toy-consumer", |event: Event, payload: Arc<String>| async move {
            println!(">>> consumer: {event} {payload} >>>");
            Ok::<ResultCode, CallError>(0)
        });

    let cfg = ConveyorConfig {
        interval: Duration::from_secs(5),
        handle_os_signals: true,
        ..ConveyorConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];

    let conveyor = Conveyor::builder(cfg)
        .with_producer(producer)
        .with_consumer(consumer)
        .with_subscribers(subs)
        .build()?;

    conveyor.start()?;
    info!("main: thread started");

    while conveyor.is_running() {
        debug!("main loop");
        thread::sleep(Duration::from_secs(2));
    }
    info!("main: conveyor thread no longer running, terminating");

    conveyor.join()?;
    Ok(())
}
