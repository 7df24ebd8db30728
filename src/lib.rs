//! Session Gateway - session lifecycle core of a messaging gateway.
//!
//! Each session is one paired device connection. This crate owns the
//! session aggregate and its state machine, the policy rules that gate each
//! command, event staging, and persistence through a repository that is
//! transparently fronted by a cache (Redis, in-memory, or none).

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
