//! # Consumer abstraction and function-backed consumer.
//!
//! Every registered [`Consume`] implementation receives every produced payload.
//! The payload is shared as `Arc<P>`, so all consumers of an item observe the
//! identical value without cloning it.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use conveyor::{CallError, Consume, ConsumeFn, ConsumerRef, Event};
//!
//! let c: ConsumerRef<String> = ConsumeFn::arc("printer", |ev: Event, payload: Arc<String>| async move {
//!     println!("{ev}: {payload}");
//!     Ok::<_, CallError>(0)
//! });
//! assert_eq!(c.name(), "printer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CallError;
use crate::schedule::Event;

/// Status code a consumer reports on success (`0` by convention).
pub type ResultCode = i32;

/// # Sink for produced payloads.
#[async_trait]
pub trait Consume<P: Send + Sync + 'static>: Send + Sync + 'static {
    /// Returns a stable, human-readable consumer name.
    fn name(&self) -> &str;

    /// Handles one item. An error is terminal for the conveyor.
    async fn consume(&self, event: Event, payload: Arc<P>) -> Result<ResultCode, CallError>;
}

/// Shared handle to a consumer.
pub type ConsumerRef<P> = Arc<dyn Consume<P>>;

/// Function-backed consumer.
#[derive(Debug)]
pub struct ConsumeFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ConsumeFn<F> {
    /// Creates a new function-backed consumer.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the consumer and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<P, F, Fut> Consume<P> for ConsumeFn<F>
where
    P: Send + Sync + 'static,
    F: Fn(Event, Arc<P>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResultCode, CallError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume(&self, event: Event, payload: Arc<P>) -> Result<ResultCode, CallError> {
        (self.f)(event, payload).await
    }
}
