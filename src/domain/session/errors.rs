//! Session-specific error types.
//!
//! | Error | Category |
//! |-------|----------|
//! | NotFound | lookup |
//! | Validation | rejected before any I/O |
//! | BusinessRule | policy violation |
//! | InvalidTransition | state machine violation |
//! | Conflict | unique name / api key already taken |
//! | External | connection service failure |
//! | Infrastructure | store failure (wrapped) |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Session-specific errors surfaced by the command handlers.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// Session was not found.
    NotFound(String),
    /// Input was malformed.
    Validation { field: String, message: String },
    /// A business rule rejected the operation.
    BusinessRule(String),
    /// The requested status change is not allowed from the current status.
    InvalidTransition { current: String, required: String },
    /// A unique field is already taken.
    Conflict(String),
    /// The external connection service failed.
    External(String),
    /// Persistence failure, with the original error attached.
    Infrastructure(DomainError),
}

impl SessionError {
    pub fn not_found(what: impl Into<String>) -> Self {
        SessionError::NotFound(what.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn business_rule(message: impl Into<String>) -> Self {
        SessionError::BusinessRule(message.into())
    }
    pub fn external(message: impl Into<String>) -> Self {
        SessionError::External(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::Validation { .. } => ErrorCode::ValidationFailed,
            SessionError::BusinessRule(_) => ErrorCode::BusinessRuleViolation,
            SessionError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            SessionError::Conflict(_) => ErrorCode::Conflict,
            SessionError::External(_) => ErrorCode::ExternalServiceError,
            SessionError::Infrastructure(err) => err.code,
        }
    }
    pub fn message(&self) -> String {
        match self {
            SessionError::NotFound(what) => format!("Session not found: {}", what),
            SessionError::Validation { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SessionError::BusinessRule(msg) => msg.clone(),
            SessionError::InvalidTransition { current, required } => format!(
                "Invalid status: session is {} but must be {}",
                current, required
            ),
            SessionError::Conflict(msg) => format!("Conflict: {}", msg),
            SessionError::External(msg) => format!("Connection service error: {}", msg),
            SessionError::Infrastructure(err) => format!("Error: {}", err.message),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Infrastructure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomainError> for SessionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::SessionNotFound => SessionError::NotFound(err.message),
            ErrorCode::ValidationFailed => SessionError::Validation {
                field: err.detail("field").unwrap_or("unknown").to_string(),
                message: err.message,
            },
            ErrorCode::InvalidStateTransition => SessionError::InvalidTransition {
                current: err.detail("current").unwrap_or("unknown").to_string(),
                required: err.detail("required").unwrap_or("unknown").to_string(),
            },
            ErrorCode::BusinessRuleViolation | ErrorCode::SessionDeleted => {
                SessionError::BusinessRule(err.message)
            }
            ErrorCode::Conflict => SessionError::Conflict(err.message),
            ErrorCode::ExternalServiceError => SessionError::External(err.message),
            _ => SessionError::Infrastructure(err),
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
