//! Publishing of staged session events.

use crate::domain::foundation::{CommandMetadata, EventEnvelope, IdGenerator};
use crate::domain::session::{Session, SessionEvent};
use crate::ports::EventPublisher;

/// Drain the session's staged events and publish them as one batch.
///
/// Publication is best-effort: a failure is logged and the drained events
/// are still returned. Delivery is at-most-once.
pub async fn flush_session_events(
    session: &mut Session,
    publisher: &dyn EventPublisher,
    ids: &dyn IdGenerator,
    metadata: &CommandMetadata,
) -> Vec<SessionEvent> {
    let events = session.take_events();
    if events.is_empty() {
        return events;
    }

    let mut envelopes = Vec::with_capacity(events.len());
    for event in &events {
        match event.to_envelope(ids) {
            Ok(envelope) => envelopes.push(with_metadata(envelope, metadata)),
            Err(e) => tracing::error!(
                session_id = %session.id(),
                event_type = event.event_type(),
                error = %e,
                "Failed to build event envelope"
            ),
        }
    }

    let count = envelopes.len();
    if let Err(e) = publisher.publish_all(envelopes).await {
        tracing::warn!(
            session_id = %session.id(),
            count,
            error = %e,
            "Failed to publish session events"
        );
    } else {
        tracing::debug!(session_id = %session.id(), count, "Published session events");
    }

    events
}

fn with_metadata(envelope: EventEnvelope, metadata: &CommandMetadata) -> EventEnvelope {
    let envelope = match metadata.correlation_id() {
        Some(id) => envelope.with_correlation_id(id),
        None => envelope,
    };
    match metadata.trace_id() {
        Some(id) => envelope.with_trace_id(id),
        None => envelope,
    }
}
