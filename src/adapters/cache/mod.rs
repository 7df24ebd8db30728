//! Session cache adapters.
//!
//! - `RedisSessionCache` - live cache on Redis
//! - `InMemorySessionCache` - live cache in process memory
//! - `NoopSessionCache` - used when caching is disabled
//! - `CachedSessionRepository` - cache-aside decorator over any `SessionRepository`

mod cached_session_repository;
mod keys;
mod noop_session_cache;
mod redis_store;
mod session_cache;
mod store;
mod warmup;

pub use cached_session_repository::{CachedSessionRepository, DEFAULT_WARM_TIMEOUT};
pub use keys::{CacheKeys, CacheTtls, DEFAULT_KEY_PREFIX};
pub use noop_session_cache::NoopSessionCache;
pub use redis_store::RedisStore;
pub use session_cache::{InMemorySessionCache, KeyValueSessionCache, RedisSessionCache};
pub use store::{InMemoryStore, KeyValueStore};
pub use warmup::WarmupTasks;
