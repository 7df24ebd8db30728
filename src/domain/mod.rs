//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `session` - Session aggregate, connection state machine and policy

pub mod foundation;
pub mod session;
