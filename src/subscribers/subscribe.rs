//! # Subscriber trait
//!
//! `Subscribe` is the extension point for observing a running conveyor. Each
//! subscriber is driven by a dedicated worker loop fed by a bounded queue owned
//! by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   pipeline nor other subscribers.
//! - Each subscriber declares its queue capacity via [`Subscribe::queue_capacity`].
//!   On overflow, notices for that subscriber are **dropped** and a
//!   `SubscriberOverflow` notice is published.
//!
//! ## Example
//! ```rust
//! use conveyor::{Notice, NoticeKind, Subscribe};
//!
//! struct Failures;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Failures {
//!     async fn on_notice(&self, n: &Notice) {
//!         if n.kind == NoticeKind::StageFailed {
//!             eprintln!("pipeline failed: {:?}", n.reason);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failures" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::notices::Notice;

/// Contract for notice subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single notice.
    async fn on_notice(&self, notice: &Notice);

    /// Human-readable name (for logs and overflow notices).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
