//! EventPublisher port - Interface for publishing domain events.
//!
//! The handlers publish staged session events through this port after the
//! repository write has succeeded. The transport behind it (in-memory bus,
//! message broker, webhook fan-out) is not visible to the domain.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Publication is not transactional with persistence. An event whose
/// publish fails after the store write is lost (at-most-once delivery), so
/// callers log publish errors instead of failing the operation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish a batch of events in order.
    ///
    /// Adapters without batch support publish sequentially and stop at the
    /// first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}
