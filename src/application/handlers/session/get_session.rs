//! GetSessionHandler - Query handler for single-session lookups.

use crate::domain::foundation::SessionId;
use crate::domain::session::{ApiKey, DeviceIdentifier, Session, SessionError, SessionName};

use super::SessionServices;

/// Which key to look a session up by.
#[derive(Debug, Clone)]
pub enum GetSessionQuery {
    ById(SessionId),
    ByName(String),
    ByApiKey(String),
    ByDevice(String),
}

pub struct GetSessionHandler {
    services: SessionServices,
}

impl GetSessionHandler {
    pub fn new(services: SessionServices) -> Self {
        Self { services }
    }

    /// Returns `NotFound` when nothing matches.
    pub async fn handle(&self, query: GetSessionQuery) -> Result<Session, SessionError> {
        let repo = &self.services.repository;
        let (found, what) = match query {
            GetSessionQuery::ById(id) => (repo.get_by_id(&id).await?, id.to_string()),
            GetSessionQuery::ByName(name) => {
                let name = SessionName::new(name)?;
                (repo.get_by_name(&name).await?, format!("name '{}'", name))
            }
            GetSessionQuery::ByApiKey(key) => {
                let key = ApiKey::new(key)?;
                (repo.get_by_api_key(&key).await?, "api key".to_string())
            }
            GetSessionQuery::ByDevice(device) => {
                let device = DeviceIdentifier::new(device)?;
                (
                    repo.get_by_device_identifier(&device).await?,
                    format!("device '{}'", device),
                )
            }
        };
        found.ok_or_else(|| SessionError::not_found(what))
    }
}
