//! Connection status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Connection status of a gateway session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Not connected to the pairing service. Initial state.
    #[default]
    Disconnected,

    /// Connection requested, waiting for the device to authenticate.
    Connecting,

    /// Connected and authenticated against a device.
    Connected,

    /// The last connection attempt or live connection failed.
    Error,
}

impl SessionStatus {
    /// All statuses, in declaration order.
    pub const ALL: [SessionStatus; 4] = [
        SessionStatus::Disconnected,
        SessionStatus::Connecting,
        SessionStatus::Connected,
        SessionStatus::Error,
    ];

    /// Returns the storage/cache representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
            SessionStatus::Error => "error",
        }
    }

    /// Returns true while a connection is live or being established.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Connected | SessionStatus::Connecting)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connecting, Error)
                | (Connected, Disconnected)
                | (Connected, Error)
                | (Error, Disconnected)
                | (Error, Connecting)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Disconnected, Error],
            Connected => vec![Disconnected, Error],
            Error => vec![Disconnected, Connecting],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Disconnected => "Disconnected",
            SessionStatus::Connecting => "Connecting",
            SessionStatus::Connected => "Connected",
            SessionStatus::Error => "Error",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disconnected" => Ok(SessionStatus::Disconnected),
            "connecting" => Ok(SessionStatus::Connecting),
            "connected" => Ok(SessionStatus::Connected),
            "error" => Ok(SessionStatus::Error),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown session status '{}'", other),
            )),
        }
    }
}
