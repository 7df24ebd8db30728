//! CreateSessionHandler - Command handler for creating new sessions.

use crate::domain::foundation::CommandMetadata;
use crate::domain::session::{
    ApiKey, NewSession, ProxyConfiguration, Session, SessionError, SessionEvent, SessionName,
    WebhookEndpoint,
};

use super::SessionServices;

/// Command to create a new session.
#[derive(Debug, Clone, Default)]
pub struct CreateSessionCommand {
    pub name: String,
    /// Supplied api key; one is generated when absent.
    pub api_key: Option<String>,
    pub webhook: Option<String>,
    /// Proxy URL, `scheme://host[:port]`.
    pub proxy: Option<String>,
}

/// Result of successful session creation.
#[derive(Debug, Clone)]
pub struct CreateSessionResult {
    pub session: Session,
    pub events: Vec<SessionEvent>,
}

/// Handler for creating sessions.
pub struct CreateSessionHandler {
    services: SessionServices,
}

impl CreateSessionHandler {
    pub fn new(services: SessionServices) -> Self {
        Self { services }
    }

    pub async fn handle(
        &self,
        cmd: CreateSessionCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateSessionResult, SessionError> {
        // 1. Validate input before any I/O
        let draft = NewSession {
            name: SessionName::new(cmd.name)?,
            api_key: cmd.api_key.map(ApiKey::new).transpose()?,
            webhook: cmd.webhook.map(WebhookEndpoint::new).transpose()?,
            proxy: cmd
                .proxy
                .as_deref()
                .map(ProxyConfiguration::parse)
                .transpose()?,
        };

        // 2. Name must be free
        if self.services.repository.get_by_name(&draft.name).await?.is_some() {
            return Err(SessionError::Conflict(format!(
                "session name '{}' is already taken",
                draft.name
            )));
        }

        // 3. Build and persist
        let mut session = self.services.factory().create(draft);
        self.services.repository.create(&session).await?;

        // 4. Publish
        let events = self.services.publish(&mut session, &metadata).await;

        tracing::info!(session_id = %session.id(), name = %session.name(), "Session created");

        Ok(CreateSessionResult { session, events })
    }
}
