//! Session domain events.
//!
//! Every successful aggregate mutation stages exactly one of these. Events are
//! named in past tense and carry the aggregate id, the occurrence time, and
//! the data specific to the transition.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, EventEnvelope, EventId, IdGenerator, SessionId, Timestamp,
};

use super::{DeviceIdentifier, SessionName};

/// Aggregate type tag carried by every session envelope.
pub const SESSION_AGGREGATE_TYPE: &str = "Session";

/// Configuration field touched by a `ConfigurationChanged` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationField {
    Proxy,
    Webhook,
    ApiKey,
    DeviceIdentifier,
}

impl fmt::Display for ConfigurationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationField::Proxy => write!(f, "proxy"),
            ConfigurationField::Webhook => write!(f, "webhook"),
            ConfigurationField::ApiKey => write!(f, "api_key"),
            ConfigurationField::DeviceIdentifier => write!(f, "device_identifier"),
        }
    }
}

/// Events that occur during the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was created in the Disconnected state.
    Created {
        session_id: SessionId,
        name: SessionName,
        occurred_at: Timestamp,
    },

    /// A connection attempt was started.
    ///
    /// State transition: Disconnected | Error → Connecting
    Connected {
        session_id: SessionId,
        occurred_at: Timestamp,
    },

    /// The device completed pairing and the session is live.
    ///
    /// State transition: Connecting → Connected
    Authenticated {
        session_id: SessionId,
        device_identifier: DeviceIdentifier,
        occurred_at: Timestamp,
    },

    /// The session was disconnected.
    ///
    /// State transition: Connecting | Connected | Error → Disconnected
    Disconnected {
        session_id: SessionId,
        reason: Option<String>,
        occurred_at: Timestamp,
    },

    /// The connection failed.
    ///
    /// State transition: Connecting | Connected → Error
    Error {
        session_id: SessionId,
        message: String,
        occurred_at: Timestamp,
    },

    /// A new pairing code is available for the device to scan.
    PairingCodeIssued {
        session_id: SessionId,
        occurred_at: Timestamp,
    },

    /// A configuration field was changed.
    ConfigurationChanged {
        session_id: SessionId,
        field: ConfigurationField,
        occurred_at: Timestamp,
    },

    /// The session was tombstoned ahead of physical removal.
    Deleted {
        session_id: SessionId,
        name: SessionName,
        occurred_at: Timestamp,
    },
}

impl SessionEvent {
    /// Returns the event type string for routing and filtering.
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Created { .. } => "session.created",
            SessionEvent::Connected { .. } => "session.connected",
            SessionEvent::Authenticated { .. } => "session.authenticated",
            SessionEvent::Disconnected { .. } => "session.disconnected",
            SessionEvent::Error { .. } => "session.error",
            SessionEvent::PairingCodeIssued { .. } => "session.pairing_code_issued",
            SessionEvent::ConfigurationChanged { .. } => "session.configuration_changed",
            SessionEvent::Deleted { .. } => "session.deleted",
        }
    }

    /// Returns the session ID associated with this event.
    pub fn session_id(&self) -> &SessionId {
        match self {
            SessionEvent::Created { session_id, .. }
            | SessionEvent::Connected { session_id, .. }
            | SessionEvent::Authenticated { session_id, .. }
            | SessionEvent::Disconnected { session_id, .. }
            | SessionEvent::Error { session_id, .. }
            | SessionEvent::PairingCodeIssued { session_id, .. }
            | SessionEvent::ConfigurationChanged { session_id, .. }
            | SessionEvent::Deleted { session_id, .. } => session_id,
        }
    }

    /// Returns when this event occurred.
    pub fn occurred_at(&self) -> Timestamp {
        match self {
            SessionEvent::Created { occurred_at, .. }
            | SessionEvent::Connected { occurred_at, .. }
            | SessionEvent::Authenticated { occurred_at, .. }
            | SessionEvent::Disconnected { occurred_at, .. }
            | SessionEvent::Error { occurred_at, .. }
            | SessionEvent::PairingCodeIssued { occurred_at, .. }
            | SessionEvent::ConfigurationChanged { occurred_at, .. }
            | SessionEvent::Deleted { occurred_at, .. } => *occurred_at,
        }
    }

    /// Wraps the event for transport.
    pub fn to_envelope(&self, ids: &dyn IdGenerator) -> Result<EventEnvelope, DomainError> {
        let payload = serde_json::to_value(self).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize {} event: {}", self.event_type(), e),
            )
        })?;

        Ok(EventEnvelope::new(
            EventId::generate(ids),
            self.event_type(),
            self.session_id().to_string(),
            SESSION_AGGREGATE_TYPE,
            self.occurred_at(),
            payload,
        ))
    }
}
