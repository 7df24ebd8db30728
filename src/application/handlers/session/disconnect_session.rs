//! DisconnectSessionHandler - Command handler for tearing down a connection.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{Session, SessionError, SessionEvent};
use crate::ports::ConnectionService;

use super::SessionServices;

#[derive(Debug, Clone)]
pub struct DisconnectSessionCommand {
    pub session_id: SessionId,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DisconnectSessionResult {
    pub session: Session,
    /// False when the session was already disconnected.
    pub changed: bool,
    pub events: Vec<SessionEvent>,
}

/// Disconnects a session. Idempotent: an already disconnected session is
/// returned untouched and nothing is written.
pub struct DisconnectSessionHandler {
    services: SessionServices,
    connections: Arc<dyn ConnectionService>,
}

impl DisconnectSessionHandler {
    pub fn new(services: SessionServices, connections: Arc<dyn ConnectionService>) -> Self {
        Self {
            services,
            connections,
        }
    }

    pub async fn handle(
        &self,
        cmd: DisconnectSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<DisconnectSessionResult, SessionError> {
        let mut session = self.services.load(&cmd.session_id).await?;

        // Hang up the live connection first; the state change goes ahead
        // even if the service cannot be reached.
        if self.services.policy.can_disconnect(&session) {
            if let Err(err) = self.connections.disconnect(&cmd.session_id).await {
                tracing::warn!(
                    session_id = %cmd.session_id,
                    error = %err,
                    "Connection service failed to disconnect session"
                );
            }
        }

        let changed = session.disconnect(cmd.reason, self.services.clock.as_ref())?;
        if !changed {
            return Ok(DisconnectSessionResult {
                session,
                changed,
                events: Vec::new(),
            });
        }

        let events = self.services.save(&mut session, &metadata).await?;
        tracing::info!(session_id = %cmd.session_id, "Session disconnected");

        Ok(DisconnectSessionResult {
            session,
            changed,
            events,
        })
    }
}
