//! # Core subscriber trait
//!
//! Each subscriber runs on its own worker task fed by a bounded queue owned by
//! the [`SubscriberSet`](crate::SubscriberSet); a slow subscriber never delays
//! the supervision loop. On queue overflow, events for that subscriber are
//! dropped with a warning.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for overflow/panic warnings).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
