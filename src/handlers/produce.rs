//! # Producer abstraction and function-backed producer.
//!
//! The [`Produce`] trait is called by the production stage once per realized
//! [`Event`]. [`ProduceFn`] wraps a closure `F: Fn(Event) -> Fut`, producing a
//! fresh future per call.
//!
//! ## Example
//! ```rust
//! use conveyor::{CallError, Event, Produce, ProduceFn, ProducerRef};
//!
//! let p: ProducerRef<String> = ProduceFn::arc("reader", |ev: Event| async move {
//!     Ok::<_, CallError>(format!("reading for {ev}"))
//! });
//! assert_eq!(p.name(), "reader");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CallError;
use crate::schedule::Event;

/// # Source of one payload per event.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use conveyor::{CallError, Event, Produce};
///
/// struct Counter;
///
/// #[async_trait]
/// impl Produce<u64> for Counter {
///     fn name(&self) -> &str { "counter" }
///
///     async fn produce(&self, event: Event) -> Result<u64, CallError> {
///         Ok(event.loop_counter * 10)
///     }
/// }
/// ```
#[async_trait]
pub trait Produce<P: Send + Sync + 'static>: Send + Sync + 'static {
    /// Returns a stable, human-readable producer name.
    fn name(&self) -> &str;

    /// Produces the payload for `event`. An error is terminal for the conveyor.
    async fn produce(&self, event: Event) -> Result<P, CallError>;
}

/// Shared handle to a producer.
pub type ProducerRef<P> = Arc<dyn Produce<P>>;

/// Function-backed producer.
#[derive(Debug)]
pub struct ProduceFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ProduceFn<F> {
    /// Creates a new function-backed producer.
    ///
    /// Prefer [`ProduceFn::arc`] when you immediately need a [`ProducerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the producer and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<P, F, Fut> Produce<P> for ProduceFn<F>
where
    P: Send + Sync + 'static,
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, CallError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn produce(&self, event: Event) -> Result<P, CallError> {
        (self.f)(event).await
    }
}
