//! ConnectSessionHandler - Command handler for starting a connection attempt.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{Session, SessionError, SessionEvent, SessionStatus};
use crate::ports::ConnectionService;

use super::SessionServices;

#[derive(Debug, Clone)]
pub struct ConnectSessionCommand {
    pub session_id: SessionId,
}

#[derive(Debug, Clone)]
pub struct ConnectSessionResult {
    pub session: Session,
    /// False when an attempt was already in flight and nothing changed.
    pub started: bool,
    pub events: Vec<SessionEvent>,
}

/// Moves a session to Connecting and asks the connection service to dial.
///
/// A dial failure is recorded on the session as Error before it is returned.
pub struct ConnectSessionHandler {
    services: SessionServices,
    connections: Arc<dyn ConnectionService>,
}

impl ConnectSessionHandler {
    pub fn new(services: SessionServices, connections: Arc<dyn ConnectionService>) -> Self {
        Self {
            services,
            connections,
        }
    }

    pub async fn handle(
        &self,
        cmd: ConnectSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<ConnectSessionResult, SessionError> {
        let mut session = self.services.load(&cmd.session_id).await?;
        self.services.policy.ensure_can_connect(&session)?;

        if session.status() == SessionStatus::Connecting {
            tracing::debug!(session_id = %cmd.session_id, "Connect already in progress");
            return Ok(ConnectSessionResult {
                session,
                started: false,
                events: Vec::new(),
            });
        }

        session.connect(self.services.clock.as_ref())?;
        let events = self.services.save(&mut session, &metadata).await?;

        if let Err(err) = self.connections.connect(&cmd.session_id).await {
            tracing::warn!(
                session_id = %cmd.session_id,
                error = %err,
                "Connection service failed to connect session"
            );
            session.set_error(err.message.clone(), self.services.clock.as_ref())?;
            self.services.save(&mut session, &metadata).await?;
            return Err(SessionError::external(err.message));
        }

        tracing::info!(session_id = %cmd.session_id, "Session connecting");

        Ok(ConnectSessionResult {
            session,
            started: true,
            events,
        })
    }
}
