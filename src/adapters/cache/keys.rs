//! Cache key layout and TTL classes.

use std::time::Duration;

use crate::domain::foundation::SessionId;
use crate::domain::session::{DeviceIdentifier, SessionName};
use crate::ports::PairingCodeFormat;

pub const DEFAULT_KEY_PREFIX: &str = "sessiongw";

/// Builds the cache key for every key class.
///
/// | class | key |
/// |-------|-----|
/// | session by id | `{p}:session:id:{id}` |
/// | session by name | `{p}:session:name:{name}` |
/// | session by device | `{p}:session:device:{device}` |
/// | device identifier | `{p}:session:{id}:device` |
/// | status | `{p}:session:{id}:status` |
/// | pairing code | `{p}:session:{id}:pairing_code` |
/// | pairing code (base64) | `{p}:session:{id}:pairing_code:base64` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn session_by_id(&self, id: &SessionId) -> String {
        format!("{}:session:id:{}", self.prefix, id)
    }

    pub fn session_by_name(&self, name: &SessionName) -> String {
        format!("{}:session:name:{}", self.prefix, name)
    }

    pub fn session_by_device(&self, device: &DeviceIdentifier) -> String {
        format!("{}:session:device:{}", self.prefix, device)
    }

    pub fn device_identifier(&self, id: &SessionId) -> String {
        format!("{}:session:{}:device", self.prefix, id)
    }

    pub fn status(&self, id: &SessionId) -> String {
        format!("{}:session:{}:status", self.prefix, id)
    }

    pub fn pairing_code(&self, id: &SessionId, format: PairingCodeFormat) -> String {
        match format {
            PairingCodeFormat::Raw => format!("{}:session:{}:pairing_code", self.prefix, id),
            PairingCodeFormat::Base64 => {
                format!("{}:session:{}:pairing_code:base64", self.prefix, id)
            }
        }
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

/// Time-to-live per key class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Full session copies (by id, name and device).
    pub session: Duration,
    pub device_identifier: Duration,
    pub status: Duration,
    pub pairing_code: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            session: Duration::from_secs(30 * 60),
            device_identifier: Duration::from_secs(24 * 60 * 60),
            status: Duration::from_secs(5 * 60),
            pairing_code: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SequentialIdGenerator;

    #[test]
    fn keys_are_prefixed_and_separated_by_class() {
        let keys = CacheKeys::default();
        let id = SessionId::generate(&SequentialIdGenerator::default());
        let name = SessionName::new("alice").unwrap();

        assert_eq!(keys.session_by_id(&id), format!("sessiongw:session:id:{}", id));
        assert_eq!(keys.session_by_name(&name), "sessiongw:session:name:alice");
        assert_eq!(keys.status(&id), format!("sessiongw:session:{}:status", id));
        assert_ne!(
            keys.pairing_code(&id, PairingCodeFormat::Raw),
            keys.pairing_code(&id, PairingCodeFormat::Base64)
        );
    }

    #[test]
    fn custom_prefix_is_used() {
        let keys = CacheKeys::new("test");
        let device = DeviceIdentifier::new("5511@s.whatsapp.net").unwrap();
        assert_eq!(
            keys.session_by_device(&device),
            "test:session:device:5511@s.whatsapp.net"
        );
    }

    #[test]
    fn default_ttls_per_class() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.session, Duration::from_secs(1800));
        assert_eq!(ttls.device_identifier, Duration::from_secs(86_400));
        assert_eq!(ttls.status, Duration::from_secs(300));
        assert_eq!(ttls.pairing_code, Duration::from_secs(60));
    }
}
