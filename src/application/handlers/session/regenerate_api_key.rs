//! RegenerateApiKeyHandler - Issues a fresh API key for a session.

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{ApiKey, Session, SessionError, SessionEvent};

use super::SessionServices;

#[derive(Debug, Clone)]
pub struct RegenerateApiKeyCommand {
    pub session_id: SessionId,
}

#[derive(Debug, Clone)]
pub struct RegenerateApiKeyResult {
    pub session: Session,
    pub events: Vec<SessionEvent>,
}

pub struct RegenerateApiKeyHandler {
    services: SessionServices,
}

impl RegenerateApiKeyHandler {
    pub fn new(services: SessionServices) -> Self {
        Self { services }
    }

    pub async fn handle(
        &self,
        cmd: RegenerateApiKeyCommand,
        metadata: CommandMetadata,
    ) -> Result<RegenerateApiKeyResult, SessionError> {
        let mut session = self.services.load(&cmd.session_id).await?;
        self.services.policy.ensure_can_regenerate_api_key(&session)?;

        let key = ApiKey::generate(self.services.ids.as_ref());
        session.regenerate_api_key(key, self.services.clock.as_ref())?;
        let events = self.services.save(&mut session, &metadata).await?;

        tracing::info!(session_id = %cmd.session_id, "API key regenerated");

        Ok(RegenerateApiKeyResult { session, events })
    }
}
