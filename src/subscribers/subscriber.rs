//! # Subscribe
//!
//! Hook for observing a supervisor: worker starts and idle exits, failed
//! invocations, rejected submissions and shutdown progress.
//!
//! Subscribers are registered on the builder and run off the hot path. The
//! worker publishes and moves on; delivery happens on the subscriber's own lane
//! (see [`SubscriberSet`](crate::SubscriberSet)).
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use offload::{Event, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.is_failure() {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives supervisor events.
///
/// `on_event` should not block the executor. A slow subscriber only fills its
/// own queue; once full, further events are dropped for it alone.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publication order.
    async fn on_event(&self, event: &Event);

    /// Label used in warnings about this subscriber.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (values below 1 are raised to 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
