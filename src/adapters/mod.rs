//! Adapters - Implementations of the ports.
//!
//! - `cache` - Session cache backends and the cache-aside repository
//! - `events` - Event publisher implementations
//! - `memory` - In-process repository for tests and local runs
//! - `postgres` - Durable session storage

pub mod cache;
pub mod events;
pub mod memory;
pub mod postgres;
