//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSessionRepository` - durable session storage

mod session_repository;

pub use session_repository::PostgresSessionRepository;
