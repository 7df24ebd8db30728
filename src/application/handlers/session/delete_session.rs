//! DeleteSessionHandler - Command handler for removing a session.
//!
//! Without `force` only a Disconnected session can go. With `force` the
//! handler first hangs up and disconnects the session, then removes it.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{SessionError, SessionEvent};
use crate::ports::ConnectionService;

use super::SessionServices;

#[derive(Debug, Clone)]
pub struct DeleteSessionCommand {
    pub session_id: SessionId,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct DeleteSessionResult {
    pub session_id: SessionId,
    pub events: Vec<SessionEvent>,
}

pub struct DeleteSessionHandler {
    services: SessionServices,
    connections: Arc<dyn ConnectionService>,
}

impl DeleteSessionHandler {
    pub fn new(services: SessionServices, connections: Arc<dyn ConnectionService>) -> Self {
        Self {
            services,
            connections,
        }
    }

    pub async fn handle(
        &self,
        cmd: DeleteSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<DeleteSessionResult, SessionError> {
        let mut session = self.services.load(&cmd.session_id).await?;
        let clock = self.services.clock.as_ref();

        if !cmd.force {
            self.services.policy.ensure_can_delete(&session)?;
        } else if !self.services.policy.can_delete(&session) {
            if self.services.policy.can_disconnect(&session) {
                if let Err(err) = self.connections.disconnect(&cmd.session_id).await {
                    tracing::warn!(
                        session_id = %cmd.session_id,
                        error = %err,
                        "Connection service failed to disconnect session before deletion"
                    );
                }
            }
            session.disconnect(Some("session deleted".to_string()), clock)?;
        }

        self.services
            .repository
            .clear_session_cache(&cmd.session_id)
            .await;
        session.delete(clock)?;
        self.services.repository.delete(&cmd.session_id).await?;

        let events = self.services.publish(&mut session, &metadata).await;
        tracing::info!(
            session_id = %cmd.session_id,
            force = cmd.force,
            "Session deleted"
        );

        Ok(DeleteSessionResult {
            session_id: cmd.session_id,
            events,
        })
    }
}
