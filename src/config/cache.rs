//! Session cache configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::adapters::cache::{CacheKeys, CacheTtls, DEFAULT_KEY_PREFIX};

use super::error::ValidationError;

/// Live cache settings. With `enabled = false` the no-op cache is used and
/// the URL is never read.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Redis connection URL
    #[serde(default = "default_url")]
    pub url: SecretString,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    #[serde(default = "default_device_ttl")]
    pub device_identifier_ttl_secs: u64,

    #[serde(default = "default_status_ttl")]
    pub status_ttl_secs: u64,

    #[serde(default = "default_pairing_code_ttl")]
    pub pairing_code_ttl_secs: u64,

    /// Deadline for the background warm-up started by bulk reads
    #[serde(default = "default_warm_timeout")]
    pub warm_timeout_secs: u64,
}

impl CacheConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn warm_timeout(&self) -> Duration {
        Duration::from_secs(self.warm_timeout_secs)
    }

    pub fn ttls(&self) -> CacheTtls {
        CacheTtls {
            session: Duration::from_secs(self.session_ttl_secs),
            device_identifier: Duration::from_secs(self.device_identifier_ttl_secs),
            status: Duration::from_secs(self.status_ttl_secs),
            pairing_code: Duration::from_secs(self.pairing_code_ttl_secs),
        }
    }

    pub fn keys(&self) -> CacheKeys {
        CacheKeys::new(self.key_prefix.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        // The prefix doubles as a SCAN pattern, so glob metacharacters are out
        let bad_char = |c: char| c.is_whitespace() || matches!(c, '*' | '?' | '[' | ']' | '\\');
        if self.key_prefix.is_empty() || self.key_prefix.contains(bad_char) {
            return Err(ValidationError::InvalidKeyPrefix);
        }
        for (ttl, class) in [
            (self.session_ttl_secs, "session"),
            (self.device_identifier_ttl_secs, "device identifier"),
            (self.status_ttl_secs, "status"),
            (self.pairing_code_ttl_secs, "pairing code"),
        ] {
            if ttl == 0 {
                return Err(ValidationError::ZeroTtl(class));
            }
        }
        if self.warm_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("cache warm-up"));
        }
        if !self.enabled {
            return Ok(());
        }

        let url = self.url.expose_secret();
        if url.is_empty() {
            return Err(ValidationError::MissingRequired("CACHE__URL"));
        }
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ValidationError::InvalidCacheUrl);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("cache connect"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_url(),
            key_prefix: default_key_prefix(),
            connect_timeout_secs: default_connect_timeout(),
            session_ttl_secs: default_session_ttl(),
            device_identifier_ttl_secs: default_device_ttl(),
            status_ttl_secs: default_status_ttl(),
            pairing_code_ttl_secs: default_pairing_code_ttl(),
            warm_timeout_secs: default_warm_timeout(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_url() -> SecretString {
    SecretString::new(String::new())
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_session_ttl() -> u64 {
    30 * 60
}

fn default_device_ttl() -> u64 {
    24 * 60 * 60
}

fn default_status_ttl() -> u64 {
    5 * 60
}

fn default_pairing_code_ttl() -> u64 {
    60
}

fn default_warm_timeout() -> u64 {
    10
}
