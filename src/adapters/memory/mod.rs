//! In-process adapters for tests and local runs.

mod session_repository;

pub use session_repository::InMemorySessionRepository;
