//! `SessionCache` over a key/value store.
//!
//! Sessions are stored as JSON under three independent keys (id, name,
//! device); status, device identifier and pairing codes as plain strings.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::session::{DeviceIdentifier, Session, SessionName, SessionStatus};
use crate::ports::{CacheError, CacheStats, PairingCodeFormat, SessionCache};

use super::keys::{CacheKeys, CacheTtls};
use super::redis_store::RedisStore;
use super::store::{InMemoryStore, KeyValueStore};

/// Live session cache backed by a key/value store.
#[derive(Debug)]
pub struct KeyValueSessionCache<S> {
    store: Arc<S>,
    keys: CacheKeys,
    ttls: CacheTtls,
}

/// Session cache on Redis.
pub type RedisSessionCache = KeyValueSessionCache<RedisStore>;

/// Session cache in process memory.
pub type InMemorySessionCache = KeyValueSessionCache<InMemoryStore>;

impl<S: KeyValueStore> KeyValueSessionCache<S> {
    pub fn new(store: Arc<S>, keys: CacheKeys, ttls: CacheTtls) -> Self {
        Self { store, keys, ttls }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    async fn get_json(&self, key: &str) -> Result<Option<Session>, CacheError> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::codec("get", key, e)),
            None => Ok(None),
        }
    }

    async fn set_json(&self, key: &str, session: &Session) -> Result<(), CacheError> {
        let raw = serde_json::to_string(session).map_err(|e| CacheError::codec("set", key, e))?;
        self.store.set_ex(key, &raw, self.ttls.session).await
    }

    async fn set_text(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.store.set_ex(key, value, ttl).await
    }
}

impl InMemorySessionCache {
    /// In-memory cache with the default key prefix and TTLs.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            CacheKeys::default(),
            CacheTtls::default(),
        )
    }
}

#[async_trait]
impl<S: KeyValueStore + 'static> SessionCache for KeyValueSessionCache<S> {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, CacheError> {
        self.get_json(&self.keys.session_by_id(id)).await
    }

    async fn set_session(&self, session: &Session) -> Result<(), CacheError> {
        self.set_json(&self.keys.session_by_id(session.id()), session)
            .await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), CacheError> {
        self.store.del(&self.keys.session_by_id(id)).await
    }

    async fn get_session_by_name(
        &self,
        name: &SessionName,
    ) -> Result<Option<Session>, CacheError> {
        self.get_json(&self.keys.session_by_name(name)).await
    }

    async fn set_session_by_name(&self, session: &Session) -> Result<(), CacheError> {
        self.set_json(&self.keys.session_by_name(session.name()), session)
            .await
    }

    async fn delete_session_by_name(&self, name: &SessionName) -> Result<(), CacheError> {
        self.store.del(&self.keys.session_by_name(name)).await
    }

    async fn get_session_by_device(
        &self,
        device: &DeviceIdentifier,
    ) -> Result<Option<Session>, CacheError> {
        self.get_json(&self.keys.session_by_device(device)).await
    }

    async fn set_session_by_device(
        &self,
        device: &DeviceIdentifier,
        session: &Session,
    ) -> Result<(), CacheError> {
        self.set_json(&self.keys.session_by_device(device), session)
            .await
    }

    async fn delete_session_by_device(&self, device: &DeviceIdentifier) -> Result<(), CacheError> {
        self.store.del(&self.keys.session_by_device(device)).await
    }

    async fn get_pairing_code(
        &self,
        id: &SessionId,
        format: PairingCodeFormat,
    ) -> Result<Option<String>, CacheError> {
        self.store.get(&self.keys.pairing_code(id, format)).await
    }

    async fn set_pairing_code(
        &self,
        id: &SessionId,
        format: PairingCodeFormat,
        code: &str,
    ) -> Result<(), CacheError> {
        self.set_text(&self.keys.pairing_code(id, format), code, self.ttls.pairing_code)
            .await
    }

    async fn delete_pairing_code(
        &self,
        id: &SessionId,
        format: PairingCodeFormat,
    ) -> Result<(), CacheError> {
        self.store.del(&self.keys.pairing_code(id, format)).await
    }

    async fn get_device_identifier(
        &self,
        id: &SessionId,
    ) -> Result<Option<DeviceIdentifier>, CacheError> {
        let key = self.keys.device_identifier(id);
        match self.store.get(&key).await? {
            Some(raw) => DeviceIdentifier::new(raw)
                .map(Some)
                .map_err(|e| CacheError::codec("get", &key, e)),
            None => Ok(None),
        }
    }

    async fn set_device_identifier(
        &self,
        id: &SessionId,
        device: &DeviceIdentifier,
    ) -> Result<(), CacheError> {
        self.set_text(
            &self.keys.device_identifier(id),
            device.as_str(),
            self.ttls.device_identifier,
        )
        .await
    }

    async fn delete_device_identifier(&self, id: &SessionId) -> Result<(), CacheError> {
        self.store.del(&self.keys.device_identifier(id)).await
    }

    async fn get_status(&self, id: &SessionId) -> Result<Option<SessionStatus>, CacheError> {
        let key = self.keys.status(id);
        match self.store.get(&key).await? {
            Some(raw) => raw
                .parse::<SessionStatus>()
                .map(Some)
                .map_err(|e| CacheError::codec("get", &key, e)),
            None => Ok(None),
        }
    }

    async fn set_status(&self, id: &SessionId, status: SessionStatus) -> Result<(), CacheError> {
        self.set_text(&self.keys.status(id), status.as_str(), self.ttls.status)
            .await
    }

    async fn delete_status(&self, id: &SessionId) -> Result<(), CacheError> {
        self.store.del(&self.keys.status(id)).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.store.ping().await
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let connected = self.store.ping().await.is_ok();
        let keys = if connected {
            self.store.key_count(&format!("{}:", self.keys.prefix())).await?
        } else {
            0
        };
        Ok(CacheStats {
            connected,
            keys,
            backend: self.store.backend_name().to_string(),
        })
    }
}
