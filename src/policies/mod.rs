//! Delivery policies.
//!
//! ## Contents
//! - [`OverflowPolicy`] what a full bounded queue does with a new item
//!
//! ## Quick wiring
//! ```text
//! ConveyorConfig { queue_capacity: usize, overflow: OverflowPolicy }
//!      └─► DeliveryQueue::new(cfg.queue_limit(), cfg.overflow)
//!           - capacity None      → unbounded, policy unused
//!           - capacity Some(n)   → policy applied when len == n
//! ```

mod overflow;

pub use overflow::OverflowPolicy;
