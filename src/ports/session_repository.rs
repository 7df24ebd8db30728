//! Session repository port.
//!
//! Defines the contract for persisting and retrieving Session aggregates.
//! The durable store implements it directly; the cache-aside decorator
//! implements it by wrapping a durable store, so callers never know whether
//! caching is in play.

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::session::{ApiKey, DeviceIdentifier, Session, SessionName, SessionStatus};
use async_trait::async_trait;

/// Default page size for `list`.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound on the page size accepted by `list`.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Pagination and filtering for `SessionRepository::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionListQuery {
    pub limit: u32,
    pub offset: u32,
    pub status: Option<SessionStatus>,
}

impl SessionListQuery {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset,
            status: None,
        }
    }

    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl Default for SessionListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

/// One page of sessions plus the total number matching the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPage {
    pub sessions: Vec<Session>,
    pub total: u64,
}

/// Repository port for Session aggregate persistence.
///
/// Implementations must ensure:
/// - session names and api keys are unique (`Conflict` otherwise)
/// - store failures surface as `DatabaseError` with the cause attached
/// - lookups that find nothing return `Ok(None)`, not an error
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session under its own id.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the id, name or api key is taken
    /// - `DatabaseError` on persistence failure
    async fn create(&self, session: &Session) -> Result<(), DomainError>;

    /// Save a new session, letting the store pick the id.
    ///
    /// Returns the id the session was stored under.
    async fn create_with_generated_id(&self, session: &Session) -> Result<SessionId, DomainError>;

    async fn get_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    async fn get_by_name(&self, name: &SessionName) -> Result<Option<Session>, DomainError>;

    async fn get_by_api_key(&self, key: &ApiKey) -> Result<Option<Session>, DomainError>;

    async fn get_by_device_identifier(
        &self,
        device: &DeviceIdentifier,
    ) -> Result<Option<Session>, DomainError>;

    /// All sessions, ordered by creation time.
    async fn get_all(&self) -> Result<Vec<Session>, DomainError>;

    /// One page of sessions, newest first.
    async fn list(&self, query: &SessionListQuery) -> Result<SessionPage, DomainError>;

    /// Overwrite an existing session (last write wins).
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `Conflict` if a renamed session collides
    async fn update(&self, session: &Session) -> Result<(), DomainError>;

    /// Physically remove a session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    async fn delete(&self, id: &SessionId) -> Result<(), DomainError>;

    async fn exists(&self, id: &SessionId) -> Result<bool, DomainError>;

    /// Sessions that are Connected or Connecting.
    async fn get_active(&self) -> Result<Vec<Session>, DomainError>;

    /// Sessions that are Disconnected or in Error.
    async fn get_inactive(&self) -> Result<Vec<Session>, DomainError>;

    /// Drop every cached copy of a session (id, device, status and pairing
    /// code keys).
    ///
    /// Durable stores hold no cache and keep this default.
    async fn clear_session_cache(&self, _id: &SessionId) {}
}
