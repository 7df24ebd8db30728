//! ReportSessionErrorHandler - Records a connection failure on a session.

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{Session, SessionError, SessionEvent};

use super::SessionServices;

#[derive(Debug, Clone)]
pub struct ReportSessionErrorCommand {
    pub session_id: SessionId,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ReportSessionErrorResult {
    pub session: Session,
    pub events: Vec<SessionEvent>,
}

pub struct ReportSessionErrorHandler {
    services: SessionServices,
}

impl ReportSessionErrorHandler {
    pub fn new(services: SessionServices) -> Self {
        Self { services }
    }

    pub async fn handle(
        &self,
        cmd: ReportSessionErrorCommand,
        metadata: CommandMetadata,
    ) -> Result<ReportSessionErrorResult, SessionError> {
        if cmd.message.trim().is_empty() {
            return Err(SessionError::validation("message", "error message is required"));
        }

        let mut session = self.services.load(&cmd.session_id).await?;
        session.set_error(cmd.message, self.services.clock.as_ref())?;
        let events = self.services.save(&mut session, &metadata).await?;

        tracing::warn!(
            session_id = %cmd.session_id,
            error = session.last_error().unwrap_or_default(),
            "Session entered error state"
        );

        Ok(ReportSessionErrorResult { session, events })
    }
}
