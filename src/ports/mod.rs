//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `SessionRepository` - Durable session storage (and its cached decorator)
//! - `SessionCache` - Key/value session cache with per-class TTLs
//!
//! ## Collaborator Ports
//!
//! - `EventPublisher` - Publishes staged domain events
//! - `ConnectionService` - External device-pairing service

mod connection_service;
mod event_publisher;
mod session_cache;
mod session_repository;

pub use connection_service::ConnectionService;
pub use event_publisher::EventPublisher;
pub use session_cache::{CacheError, CacheStats, PairingCodeFormat, SessionCache};
pub use session_repository::{
    SessionListQuery, SessionPage, SessionRepository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
