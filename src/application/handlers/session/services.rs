//! Collaborators shared by the session handlers.

use std::sync::Arc;

use crate::domain::foundation::{Clock, CommandMetadata, IdGenerator, SessionId};
use crate::domain::session::{Session, SessionError, SessionEvent, SessionFactory, SessionPolicy};
use crate::ports::{EventPublisher, SessionRepository};

use super::event_flush::flush_session_events;

/// Repository, publisher and the injected id/time sources.
#[derive(Clone)]
pub struct SessionServices {
    pub repository: Arc<dyn SessionRepository>,
    pub publisher: Arc<dyn EventPublisher>,
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
    pub policy: SessionPolicy,
}

impl SessionServices {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        publisher: Arc<dyn EventPublisher>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            publisher,
            ids,
            clock,
            policy: SessionPolicy,
        }
    }

    pub fn factory(&self) -> SessionFactory {
        SessionFactory::new(Arc::clone(&self.ids), Arc::clone(&self.clock))
    }

    /// Load a session or fail with `NotFound`.
    pub async fn load(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| SessionError::not_found(id.to_string()))
    }

    /// Write the session, then publish what it staged.
    ///
    /// Events are drained only after the write succeeded; on a failed write
    /// they are discarded with the aggregate.
    pub async fn save(
        &self,
        session: &mut Session,
        metadata: &CommandMetadata,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        self.repository.update(session).await?;
        Ok(self.publish(session, metadata).await)
    }

    pub async fn publish(
        &self,
        session: &mut Session,
        metadata: &CommandMetadata,
    ) -> Vec<SessionEvent> {
        flush_session_events(
            session,
            self.publisher.as_ref(),
            self.ids.as_ref(),
            metadata,
        )
        .await
    }
}

impl std::fmt::Debug for SessionServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionServices").finish_non_exhaustive()
    }
}
