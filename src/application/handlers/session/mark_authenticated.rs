//! MarkAuthenticatedHandler - Records that a device finished pairing.

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{DeviceIdentifier, Session, SessionError, SessionEvent};

use super::SessionServices;

#[derive(Debug, Clone)]
pub struct MarkAuthenticatedCommand {
    pub session_id: SessionId,
    pub device_identifier: String,
}

#[derive(Debug, Clone)]
pub struct MarkAuthenticatedResult {
    pub session: Session,
    pub events: Vec<SessionEvent>,
}

pub struct MarkAuthenticatedHandler {
    services: SessionServices,
}

impl MarkAuthenticatedHandler {
    pub fn new(services: SessionServices) -> Self {
        Self { services }
    }

    pub async fn handle(
        &self,
        cmd: MarkAuthenticatedCommand,
        metadata: CommandMetadata,
    ) -> Result<MarkAuthenticatedResult, SessionError> {
        let device = DeviceIdentifier::new(cmd.device_identifier)?;
        let mut session = self.services.load(&cmd.session_id).await?;

        // One device per session
        if let Some(owner) = self
            .services
            .repository
            .get_by_device_identifier(&device)
            .await?
        {
            if owner.id() != session.id() {
                return Err(SessionError::Conflict(format!(
                    "device '{}' is already paired with session '{}'",
                    device,
                    owner.name()
                )));
            }
        }

        session.mark_authenticated(device, self.services.clock.as_ref())?;
        self.services.policy.validate_device_connection(&session)?;
        let events = self.services.save(&mut session, &metadata).await?;

        tracing::info!(
            session_id = %cmd.session_id,
            device = ?session.device_identifier().map(DeviceIdentifier::as_str),
            "Session authenticated"
        );

        Ok(MarkAuthenticatedResult { session, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::{CachedSessionRepository, InMemorySessionCache};
    use crate::application::handlers::session::test_support::Harness;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::session::SessionStatus;
    use crate::ports::SessionRepository;
    use std::sync::Arc;

    async fn connecting(h: &Harness, name: &str) -> Session {
        let mut session = h.seed(name).await;
        session.connect(h.clock.as_ref()).unwrap();
        session.clear_events();
        h.repository.update(&session).await.unwrap();
        session
    }

    #[tokio::test]
    async fn connecting_session_becomes_connected() {
        let h = Harness::new();
        let session = connecting(&h, "alice").await;
        h.clock.advance_secs(5);

        let result = MarkAuthenticatedHandler::new(h.services.clone())
            .handle(
                MarkAuthenticatedCommand {
                    session_id: *session.id(),
                    device_identifier: "5511999999999@s.whatsapp.net".into(),
                },
                CommandMetadata::new(),
            )
            .await
            .unwrap();

        let stored = h.stored(session.id()).await.unwrap();
        assert_eq!(stored.status(), SessionStatus::Connected);
        assert_eq!(stored.connected_at(), Some(&h.now()));
        assert_eq!(
            stored.device_identifier().map(DeviceIdentifier::as_str),
            Some("5511999999999@s.whatsapp.net")
        );
        assert_eq!(result.events.len(), 1);
        assert_eq!(h.bus.event_types(), vec!["session.authenticated"]);
    }

    #[tokio::test]
    async fn device_paired_elsewhere_is_a_conflict() {
        let h = Harness::new();
        h.seed_connected("bob", "dev-1").await;
        let session = connecting(&h, "alice").await;

        let err = MarkAuthenticatedHandler::new(h.services.clone())
            .handle(
                MarkAuthenticatedCommand {
                    session_id: *session.id(),
                    device_identifier: "dev-1".into(),
                },
                CommandMetadata::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(
            h.stored(session.id()).await.unwrap().status(),
            SessionStatus::Connecting
        );
    }

    #[tokio::test]
    async fn device_released_by_another_session_can_be_paired() {
        let h = Harness::new();
        let cached = Arc::new(CachedSessionRepository::new(
            h.repository.clone(),
            Arc::new(InMemorySessionCache::in_memory()),
        ));
        let mut services = h.services.clone();
        services.repository = cached.clone();

        let mut bob = h.seed("bob").await;
        bob.set_device_identifier("dev-1", h.clock.as_ref()).unwrap();
        cached.update(&bob).await.unwrap();
        let dev_1 = DeviceIdentifier::new("dev-1").unwrap();
        assert!(cached.get_by_device_identifier(&dev_1).await.unwrap().is_some());
        bob.set_device_identifier("dev-2", h.clock.as_ref()).unwrap();
        cached.update(&bob).await.unwrap();

        let alice = connecting(&h, "alice").await;
        let result = MarkAuthenticatedHandler::new(services)
            .handle(
                MarkAuthenticatedCommand {
                    session_id: *alice.id(),
                    device_identifier: "dev-1".into(),
                },
                CommandMetadata::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.session.status(), SessionStatus::Connected);
        assert_eq!(result.session.device_identifier(), Some(&dev_1));
    }

    #[tokio::test]
    async fn disconnected_session_cannot_authenticate() {
        let h = Harness::new();
        let session = h.seed("alice").await;

        let err = MarkAuthenticatedHandler::new(h.services.clone())
            .handle(
                MarkAuthenticatedCommand {
                    session_id: *session.id(),
                    device_identifier: "dev-1".into(),
                },
                CommandMetadata::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(h.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn blank_device_is_rejected() {
        let h = Harness::new();
        let session = connecting(&h, "alice").await;

        let err = MarkAuthenticatedHandler::new(h.services.clone())
            .handle(
                MarkAuthenticatedCommand {
                    session_id: *session.id(),
                    device_identifier: "   ".into(),
                },
                CommandMetadata::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Validation { .. }));
    }
}
