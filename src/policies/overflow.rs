//! # Overflow policies for a bounded delivery queue.
//!
//! [`OverflowPolicy`] decides what happens when the production stage pushes an
//! item onto a bounded [`DeliveryQueue`](crate::DeliveryQueue) that is already full.
//!
//! - [`OverflowPolicy::Block`] the producer side waits for a free slot (default).
//! - [`OverflowPolicy::DropOldest`] the oldest queued item is discarded to make room.
//! - [`OverflowPolicy::Fail`] the push is rejected and the conveyor stops with
//!   [`ConveyorError::QueueFull`](crate::ConveyorError::QueueFull).
//!
//! An unbounded queue never consults the policy.
//!
//! ## Choosing the right policy
//! ```text
//! Every tick must be delivered, lag is fine   → Block
//! Only the freshest readings matter           → DropOldest
//! A stalled consumer is a bug, stop loudly    → Fail
//! ```
//!
//! Note that `Block` stalls the production stage, and with it the event
//! sequence: ticks that pass while blocked are skipped, not queued up.

/// Policy applied when a bounded queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Wait until the consumption stage frees a slot.
    #[default]
    Block,
    /// Discard the oldest queued item and enqueue the new one.
    DropOldest,
    /// Reject the new item; terminal for the conveyor.
    Fail,
}

impl OverflowPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OverflowPolicy::Block => "block",
            OverflowPolicy::DropOldest => "drop_oldest",
            OverflowPolicy::Fail => "fail",
        }
    }
}
