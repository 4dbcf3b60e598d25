//! # Delivery queue between the production and consumption stages.
//!
//! A FIFO hand-off with one pusher (production stage) and one popper
//! (consumption stage), both living on the worker's runtime.
//!
//! ## Rules
//! - **FIFO**: the n-th item pushed is the n-th item popped.
//! - **Unbounded** (`capacity = None`): `push` never waits; memory grows if the popper stalls.
//! - **Bounded** (`capacity = Some(n)`): when full, [`OverflowPolicy`] decides:
//!   - `Block` → `push` waits for a slot,
//!   - `DropOldest` → the oldest item is evicted and handed back,
//!   - `Fail` → the new item is handed back as rejected.
//!
//! ## Internals
//! A `VecDeque` behind a short, never-held-across-await mutex, plus two
//! [`Notify`]s (`ready` for the popper, `space` for a blocked pusher). `notify_one`
//! stores a permit when nobody waits, so a wake-up between unlock and await is not lost.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::policies::OverflowPolicy;
use crate::schedule::Event;

/// One produced payload bound to the event it was produced for.
#[derive(Debug)]
pub struct QueueItem<P> {
    /// Event the payload belongs to.
    pub event: Event,
    /// Payload shared by all consumers.
    pub payload: Arc<P>,
}

impl<P> Clone for QueueItem<P> {
    fn clone(&self) -> Self {
        Self {
            event: self.event,
            payload: Arc::clone(&self.payload),
        }
    }
}

/// Outcome of a successful [`DeliveryQueue::push`].
#[derive(Debug, PartialEq, Eq)]
pub enum Pushed<T> {
    /// The item was appended.
    Queued,
    /// The item was appended after evicting this oldest item (`DropOldest`).
    Displaced(T),
}

/// FIFO queue with optional capacity and overflow policy.
#[derive(Debug)]
pub struct DeliveryQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: Option<usize>,
    overflow: OverflowPolicy,
    ready: Notify,
    space: Notify,
}

impl<T> DeliveryQueue<T> {
    /// Creates a queue; `capacity = None` means unbounded, `Some(0)` is treated as `Some(1)`.
    pub fn new(capacity: Option<usize>, overflow: OverflowPolicy) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: capacity.map(|c| c.max(1)),
            overflow,
            ready: Notify::new(),
            space: Notify::new(),
        }
    }

    /// Creates an unbounded queue.
    pub fn unbounded() -> Self {
        Self::new(None, OverflowPolicy::default())
    }

    /// Capacity, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Appends `item`, applying the overflow policy if the queue is bounded and full.
    ///
    /// Returns `Err(item)` when the policy is `Fail` and the queue is full.
    pub async fn push(&self, item: T) -> Result<Pushed<T>, T> {
        loop {
            {
                let mut items = self.lock();
                let full = self.capacity.is_some_and(|cap| items.len() >= cap);
                if !full {
                    items.push_back(item);
                    drop(items);
                    self.ready.notify_one();
                    return Ok(Pushed::Queued);
                }
                match self.overflow {
                    OverflowPolicy::Block => {}
                    OverflowPolicy::DropOldest => {
                        let oldest = items.pop_front();
                        items.push_back(item);
                        drop(items);
                        self.ready.notify_one();
                        return Ok(match oldest {
                            Some(old) => Pushed::Displaced(old),
                            None => Pushed::Queued,
                        });
                    }
                    OverflowPolicy::Fail => return Err(item),
                }
            }
            self.space.notified().await;
        }
    }

    /// Removes the oldest item, waiting while the queue is empty.
    pub async fn pop(&self) -> T {
        loop {
            let next = self.lock().pop_front();
            if let Some(item) = next {
                self.space.notify_one();
                return item;
            }
            self.ready.notified().await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
