//! Session cache used when caching is disabled.
//!
//! Every read misses and every write succeeds without storing anything, so
//! the decorator behaves exactly as with a permanently cold cache.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::session::{DeviceIdentifier, Session, SessionName, SessionStatus};
use crate::ports::{CacheError, CacheStats, PairingCodeFormat, SessionCache};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionCache;

impl NoopSessionCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionCache for NoopSessionCache {
    async fn get_session(&self, _id: &SessionId) -> Result<Option<Session>, CacheError> {
        Ok(None)
    }

    async fn set_session(&self, _session: &Session) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_session(&self, _id: &SessionId) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get_session_by_name(
        &self,
        _name: &SessionName,
    ) -> Result<Option<Session>, CacheError> {
        Ok(None)
    }

    async fn set_session_by_name(&self, _session: &Session) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_session_by_name(&self, _name: &SessionName) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get_session_by_device(
        &self,
        _device: &DeviceIdentifier,
    ) -> Result<Option<Session>, CacheError> {
        Ok(None)
    }

    async fn set_session_by_device(
        &self,
        _device: &DeviceIdentifier,
        _session: &Session,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_session_by_device(
        &self,
        _device: &DeviceIdentifier,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get_pairing_code(
        &self,
        _id: &SessionId,
        _format: PairingCodeFormat,
    ) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set_pairing_code(
        &self,
        _id: &SessionId,
        _format: PairingCodeFormat,
        _code: &str,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_pairing_code(
        &self,
        _id: &SessionId,
        _format: PairingCodeFormat,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get_device_identifier(
        &self,
        _id: &SessionId,
    ) -> Result<Option<DeviceIdentifier>, CacheError> {
        Ok(None)
    }

    async fn set_device_identifier(
        &self,
        _id: &SessionId,
        _device: &DeviceIdentifier,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_device_identifier(&self, _id: &SessionId) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get_status(&self, _id: &SessionId) -> Result<Option<SessionStatus>, CacheError> {
        Ok(None)
    }

    async fn set_status(&self, _id: &SessionId, _status: SessionStatus) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_status(&self, _id: &SessionId) -> Result<(), CacheError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(CacheStats {
            connected: false,
            keys: 0,
            backend: "noop".to_string(),
        })
    }
}
