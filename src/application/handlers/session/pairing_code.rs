//! Pairing code handlers.
//!
//! The code lives on the aggregate and, for fast polling by clients, in the
//! cache under a short TTL in up to two encodings. Cache writes are
//! best-effort; the stored session stays the source of truth for the raw
//! code.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, SessionId};
use crate::domain::session::{Session, SessionError, SessionEvent};
use crate::ports::{ConnectionService, PairingCodeFormat, SessionCache};

use super::SessionServices;

// ════════════════════════════════════════════════════════════════════════════
// Set
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct SetPairingCodeCommand {
    pub session_id: SessionId,
    pub code: String,
    /// Display rendering of the code, already base64-encoded by the caller.
    pub base64: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SetPairingCodeResult {
    pub session: Session,
    /// False when the code was blank or unchanged.
    pub changed: bool,
    pub events: Vec<SessionEvent>,
}

pub struct SetPairingCodeHandler {
    services: SessionServices,
    cache: Arc<dyn SessionCache>,
}

impl SetPairingCodeHandler {
    pub fn new(services: SessionServices, cache: Arc<dyn SessionCache>) -> Self {
        Self { services, cache }
    }

    pub async fn handle(
        &self,
        cmd: SetPairingCodeCommand,
        metadata: CommandMetadata,
    ) -> Result<SetPairingCodeResult, SessionError> {
        let mut session = self.services.load(&cmd.session_id).await?;

        let changed = session.set_pairing_code(&cmd.code, self.services.clock.as_ref())?;
        if !changed {
            return Ok(SetPairingCodeResult {
                session,
                changed,
                events: Vec::new(),
            });
        }

        let events = self.services.save(&mut session, &metadata).await?;

        self.cache_code(&cmd.session_id, PairingCodeFormat::Raw, &cmd.code)
            .await;
        if let Some(encoded) = cmd.base64.as_deref().filter(|e| !e.trim().is_empty()) {
            self.cache_code(&cmd.session_id, PairingCodeFormat::Base64, encoded)
                .await;
        }

        tracing::debug!(session_id = %cmd.session_id, "Pairing code issued");

        Ok(SetPairingCodeResult {
            session,
            changed,
            events,
        })
    }

    async fn cache_code(&self, id: &SessionId, format: PairingCodeFormat, code: &str) {
        if let Err(err) = self.cache.set_pairing_code(id, format, code).await {
            tracing::warn!(
                session_id = %id,
                format = ?format,
                error = %err,
                "Failed to cache pairing code"
            );
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Request
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct RequestPairingCodeCommand {
    pub session_id: SessionId,
    /// Pair by phone number instead of QR.
    pub phone: Option<String>,
}

/// Asks the connection service for a pairing code and records it.
pub struct RequestPairingCodeHandler {
    connections: Arc<dyn ConnectionService>,
    setter: SetPairingCodeHandler,
}

impl RequestPairingCodeHandler {
    pub fn new(
        services: SessionServices,
        cache: Arc<dyn SessionCache>,
        connections: Arc<dyn ConnectionService>,
    ) -> Self {
        Self {
            connections,
            setter: SetPairingCodeHandler::new(services, cache),
        }
    }

    /// Returns `Ok(None)` when the service has no code to offer yet.
    pub async fn handle(
        &self,
        cmd: RequestPairingCodeCommand,
        metadata: CommandMetadata,
    ) -> Result<Option<SetPairingCodeResult>, SessionError> {
        let session = self.setter.services.load(&cmd.session_id).await?;
        if session.is_authenticated() && session.status().is_active() {
            return Err(SessionError::business_rule(
                "session is already paired with a device",
            ));
        }

        let code = match cmd.phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => Some(
                self.connections
                    .pair_with_phone(&cmd.session_id, phone)
                    .await
                    .map_err(|err| SessionError::external(err.message))?,
            ),
            _ => self
                .connections
                .pairing_code(&cmd.session_id)
                .await
                .map_err(|err| SessionError::external(err.message))?,
        };

        let Some(code) = code else {
            return Ok(None);
        };

        self.setter
            .handle(
                SetPairingCodeCommand {
                    session_id: cmd.session_id,
                    code,
                    base64: None,
                },
                metadata,
            )
            .await
            .map(Some)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Get
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct GetPairingCodeQuery {
    pub session_id: SessionId,
    pub format: PairingCodeFormat,
}

/// Reads the current pairing code, cache first.
///
/// The raw code falls back to the stored session on a miss. The base64
/// rendering only exists in the cache.
pub struct GetPairingCodeHandler {
    services: SessionServices,
    cache: Arc<dyn SessionCache>,
}

impl GetPairingCodeHandler {
    pub fn new(services: SessionServices, cache: Arc<dyn SessionCache>) -> Self {
        Self { services, cache }
    }

    pub async fn handle(&self, query: GetPairingCodeQuery) -> Result<Option<String>, SessionError> {
        match self
            .cache
            .get_pairing_code(&query.session_id, query.format)
            .await
        {
            Ok(Some(code)) => return Ok(Some(code)),
            Ok(None) => {}
            Err(err) => tracing::warn!(
                session_id = %query.session_id,
                error = %err,
                "Pairing code cache read failed"
            ),
        }

        let session = self.services.load(&query.session_id).await?;
        Ok(match query.format {
            PairingCodeFormat::Raw => session.pairing_code().map(|c| c.as_str().to_string()),
            PairingCodeFormat::Base64 => None,
        })
    }
}
