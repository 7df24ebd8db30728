//! Session cache port.
//!
//! Key/value access to denormalized session data, one key class per lookup
//! (id, name, device, status, pairing code), each with its own TTL. Two
//! implementations must be interchangeable from the decorator's point of
//! view: a live backend and a no-op one that always misses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::SessionId;
use crate::domain::session::{DeviceIdentifier, Session, SessionName, SessionStatus};

/// Port for the session cache backend.
///
/// Reads return `Ok(None)` on a miss. `Err` is reserved for backend or
/// decoding failures, so the two can be told apart.
#[async_trait]
pub trait SessionCache: Send + Sync {
    // Session by id
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, CacheError>;
    async fn set_session(&self, session: &Session) -> Result<(), CacheError>;
    async fn delete_session(&self, id: &SessionId) -> Result<(), CacheError>;

    // Session by name
    async fn get_session_by_name(&self, name: &SessionName)
        -> Result<Option<Session>, CacheError>;
    async fn set_session_by_name(&self, session: &Session) -> Result<(), CacheError>;
    async fn delete_session_by_name(&self, name: &SessionName) -> Result<(), CacheError>;

    // Session by device identifier
    async fn get_session_by_device(
        &self,
        device: &DeviceIdentifier,
    ) -> Result<Option<Session>, CacheError>;
    async fn set_session_by_device(
        &self,
        device: &DeviceIdentifier,
        session: &Session,
    ) -> Result<(), CacheError>;
    async fn delete_session_by_device(&self, device: &DeviceIdentifier) -> Result<(), CacheError>;

    // Pairing code
    async fn get_pairing_code(
        &self,
        id: &SessionId,
        format: PairingCodeFormat,
    ) -> Result<Option<String>, CacheError>;
    async fn set_pairing_code(
        &self,
        id: &SessionId,
        format: PairingCodeFormat,
        code: &str,
    ) -> Result<(), CacheError>;
    async fn delete_pairing_code(
        &self,
        id: &SessionId,
        format: PairingCodeFormat,
    ) -> Result<(), CacheError>;

    // Device identifier
    async fn get_device_identifier(
        &self,
        id: &SessionId,
    ) -> Result<Option<DeviceIdentifier>, CacheError>;
    async fn set_device_identifier(
        &self,
        id: &SessionId,
        device: &DeviceIdentifier,
    ) -> Result<(), CacheError>;
    async fn delete_device_identifier(&self, id: &SessionId) -> Result<(), CacheError>;

    // Status
    async fn get_status(&self, id: &SessionId) -> Result<Option<SessionStatus>, CacheError>;
    async fn set_status(&self, id: &SessionId, status: SessionStatus) -> Result<(), CacheError>;
    async fn delete_status(&self, id: &SessionId) -> Result<(), CacheError>;

    /// Liveness check.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Aggregate statistics for health reporting.
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

/// Which encoding of the pairing code a key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairingCodeFormat {
    /// The code as issued by the connection service.
    Raw,
    /// The code rendered and base64-encoded for display.
    Base64,
}

impl PairingCodeFormat {
    pub const ALL: [PairingCodeFormat; 2] = [PairingCodeFormat::Raw, PairingCodeFormat::Base64];
}

/// Snapshot of cache health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub connected: bool,
    pub keys: u64,
    pub backend: String,
}

/// Errors from the cache backend, tagged with the operation and key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("cache {operation} failed for '{key}': {message}")]
    Backend {
        operation: String,
        key: String,
        message: String,
    },

    /// A stored value could not be encoded or decoded.
    #[error("cache {operation} could not encode/decode '{key}': {message}")]
    Codec {
        operation: String,
        key: String,
        message: String,
    },
}

impl CacheError {
    pub fn backend(operation: &str, key: &str, message: impl fmt::Display) -> Self {
        CacheError::Backend {
            operation: operation.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn codec(operation: &str, key: &str, message: impl fmt::Display) -> Self {
        CacheError::Codec {
            operation: operation.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            CacheError::Backend { operation, .. } | CacheError::Codec { operation, .. } => operation,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            CacheError::Backend { key, .. } | CacheError::Codec { key, .. } => key,
        }
    }
}
