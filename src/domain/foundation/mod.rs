//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, time, error types, event transport types and the
//! state machine trait that form the vocabulary of the gateway domain.

mod command;
mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{EventEnvelope, EventId, EventMetadata};
pub use ids::{IdGenerator, SequentialIdGenerator, SessionId, UuidGenerator};
pub use state_machine::StateMachine;
pub use timestamp::{Clock, ManualClock, SystemClock, Timestamp};
