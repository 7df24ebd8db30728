//! Redis-backed key/value store for the live session cache.
//!
//! One multiplexed async connection is cloned per command. Entries are
//! written with `SET key value EX ttl` so expiry is handled by Redis.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use crate::ports::CacheError;

use super::store::KeyValueStore;

#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Open a multiplexed connection, giving up after `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::backend("connect", "", e))?;
        let conn = tokio::time::timeout(timeout, client.get_multiplexed_tokio_connection())
            .await
            .map_err(|_| CacheError::backend("connect", "", "connection timed out"))?
            .map_err(|e| CacheError::backend("connect", "", e))?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e: redis::RedisError| CacheError::backend("get", key, e))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CacheError::backend("set", key, e))
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e: redis::RedisError| CacheError::backend("delete", key, e))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::backend("ping", "", e))?;
        if reply != "PONG" {
            return Err(CacheError::backend("ping", "", format!("unexpected reply {}", reply)));
        }
        Ok(())
    }

    /// Counts with `SCAN MATCH {prefix}*`, so other tenants of a shared
    /// database are not included.
    async fn key_count(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut keys = conn
            .scan_match::<_, String>(&pattern)
            .await
            .map_err(|e: redis::RedisError| CacheError::backend("stats", &pattern, e))?;
        let mut count = 0u64;
        while keys.next_item().await.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let err = RedisStore::connect("not-a-redis-url", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.operation(), "connect");
    }
}
