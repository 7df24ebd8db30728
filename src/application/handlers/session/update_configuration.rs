//! UpdateConfigurationHandler - Changes proxy, webhook or device settings.

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{
    ProxyConfiguration, Session, SessionError, SessionEvent, WebhookEndpoint,
};

use super::SessionServices;

/// Partial update. `None` leaves a field alone; `Some(None)` clears it.
#[derive(Debug, Clone)]
pub struct UpdateConfigurationCommand {
    pub session_id: SessionId,
    pub proxy: Option<Option<String>>,
    pub webhook: Option<Option<String>>,
    pub device_identifier: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateConfigurationResult {
    pub session: Session,
    pub events: Vec<SessionEvent>,
}

pub struct UpdateConfigurationHandler {
    services: SessionServices,
}

impl UpdateConfigurationHandler {
    pub fn new(services: SessionServices) -> Self {
        Self { services }
    }

    pub async fn handle(
        &self,
        cmd: UpdateConfigurationCommand,
        metadata: CommandMetadata,
    ) -> Result<UpdateConfigurationResult, SessionError> {
        let proxy = match cmd.proxy {
            Some(Some(url)) => Some(Some(ProxyConfiguration::parse(&url)?)),
            Some(None) => Some(None),
            None => None,
        };
        let webhook = match cmd.webhook {
            Some(Some(url)) => Some(Some(WebhookEndpoint::new(url)?)),
            Some(None) => Some(None),
            None => None,
        };

        let mut session = self.services.load(&cmd.session_id).await?;
        let clock = self.services.clock.as_ref();

        if let Some(proxy) = proxy {
            self.services.policy.ensure_can_set_proxy(&session)?;
            session.update_proxy(proxy, clock)?;
        }
        if let Some(webhook) = webhook {
            session.update_webhook(webhook, clock)?;
        }
        if let Some(device) = cmd.device_identifier {
            session.set_device_identifier(&device, clock)?;
        }

        if session.pending_events().is_empty() {
            return Ok(UpdateConfigurationResult {
                session,
                events: Vec::new(),
            });
        }

        let events = self.services.save(&mut session, &metadata).await?;
        tracing::info!(
            session_id = %cmd.session_id,
            changes = events.len(),
            "Session configuration updated"
        );

        Ok(UpdateConfigurationResult { session, events })
    }
}
