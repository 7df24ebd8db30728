//! Connection service port.
//!
//! The external device-pairing service owns the protocol connection. The
//! gateway core only records the outcome of these calls on the aggregate
//! (status, device identifier, pairing code).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SessionId};

/// Port for the external device-pairing/protocol service.
///
/// Failures are reported as `ExternalServiceError`.
#[async_trait]
pub trait ConnectionService: Send + Sync {
    /// Open (or resume) the protocol connection for a session.
    async fn connect(&self, id: &SessionId) -> Result<(), DomainError>;

    /// Close the protocol connection for a session.
    async fn disconnect(&self, id: &SessionId) -> Result<(), DomainError>;

    /// Current pairing code for a session waiting on authentication, if any.
    async fn pairing_code(&self, id: &SessionId) -> Result<Option<String>, DomainError>;

    /// Request a phone-number pairing code.
    async fn pair_with_phone(&self, id: &SessionId, phone: &str) -> Result<String, DomainError>;

    async fn is_connected(&self, id: &SessionId) -> Result<bool, DomainError>;
}
