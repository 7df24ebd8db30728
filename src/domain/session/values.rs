//! Session value objects.
//!
//! Each type validates on construction and deserializes through the same
//! validation, so values read back from the store or the cache are checked
//! exactly like user input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{IdGenerator, ValidationError};

/// Minimum length for session names.
pub const MIN_NAME_LENGTH: usize = 3;

/// Maximum length for session names.
pub const MAX_NAME_LENGTH: usize = 50;

/// Minimum length for API keys.
pub const MIN_API_KEY_LENGTH: usize = 16;

/// Maximum length for API keys.
pub const MAX_API_KEY_LENGTH: usize = 128;

/// Maximum length for device identifiers.
pub const MAX_DEVICE_IDENTIFIER_LENGTH: usize = 255;

/// Maximum length for pairing codes.
pub const MAX_PAIRING_CODE_LENGTH: usize = 1024;

/// Maximum length for webhook URLs.
pub const MAX_WEBHOOK_LENGTH: usize = 2048;

// ════════════════════════════════════════════════════════════════════════════
// SessionName
// ════════════════════════════════════════════════════════════════════════════

/// Unique, human-chosen session slug.
///
/// 3-50 characters from `[A-Za-z0-9_-]`, starting with a letter or digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionName(String);

impl SessionName {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        let len = name.chars().count();
        if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
            return Err(ValidationError::invalid_length(
                "name",
                MIN_NAME_LENGTH,
                MAX_NAME_LENGTH,
                len,
            ));
        }
        if !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValidationError::invalid_format(
                "name",
                "must start with a letter or digit",
            ));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ValidationError::invalid_format(
                "name",
                format!("character '{}' is not allowed", bad),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionName> for String {
    fn from(value: SessionName) -> Self {
        value.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ApiKey
// ════════════════════════════════════════════════════════════════════════════

/// Per-session API key. Unique across sessions.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::empty_field("api_key"));
        }
        let len = key.len();
        if !(MIN_API_KEY_LENGTH..=MAX_API_KEY_LENGTH).contains(&len) {
            return Err(ValidationError::invalid_length(
                "api_key",
                MIN_API_KEY_LENGTH,
                MAX_API_KEY_LENGTH,
                len,
            ));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "api_key",
                "only letters, digits, '-' and '_' are allowed",
            ));
        }
        Ok(Self(key))
    }

    /// Generates a fresh key from two generator draws.
    pub fn generate(ids: &dyn IdGenerator) -> Self {
        Self(format!(
            "sk_{}{}",
            ids.next_uuid().simple(),
            ids.next_uuid().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ApiKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKey> for String {
    fn from(value: ApiKey) -> Self {
        value.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DeviceIdentifier
// ════════════════════════════════════════════════════════════════════════════

/// External device/account identifier assigned by the pairing service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceIdentifier(String);

impl DeviceIdentifier {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::empty_field("device_identifier"));
        }
        if id.len() > MAX_DEVICE_IDENTIFIER_LENGTH {
            return Err(ValidationError::invalid_length(
                "device_identifier",
                1,
                MAX_DEVICE_IDENTIFIER_LENGTH,
                id.len(),
            ));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "device_identifier",
                "must not contain whitespace",
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceIdentifier {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceIdentifier> for String {
    fn from(value: DeviceIdentifier) -> Self {
        value.0
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PairingCode
// ════════════════════════════════════════════════════════════════════════════

/// Ephemeral pairing code (QR payload or phone pairing code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PairingCode(String);

impl PairingCode {
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(ValidationError::empty_field("pairing_code"));
        }
        if code.len() > MAX_PAIRING_CODE_LENGTH {
            return Err(ValidationError::invalid_length(
                "pairing_code",
                1,
                MAX_PAIRING_CODE_LENGTH,
                code.len(),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PairingCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PairingCode> for String {
    fn from(value: PairingCode) -> Self {
        value.0
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ProxyConfiguration
// ════════════════════════════════════════════════════════════════════════════

/// Supported outbound proxy schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    Http,
    Https,
    Socks5,
}

impl ProxyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyScheme::Http => "http",
            ProxyScheme::Https => "https",
            ProxyScheme::Socks5 => "socks5",
        }
    }
}

impl FromStr for ProxyScheme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(ProxyScheme::Http),
            "https" => Ok(ProxyScheme::Https),
            "socks5" => Ok(ProxyScheme::Socks5),
            other => Err(ValidationError::invalid_format(
                "proxy",
                format!("unsupported scheme '{}'", other),
            )),
        }
    }
}

/// Outbound proxy descriptor: scheme plus host, optional port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfiguration {
    scheme: ProxyScheme,
    host: String,
    port: Option<u16>,
}

impl ProxyConfiguration {
    pub fn new(
        scheme: ProxyScheme,
        host: impl Into<String>,
        port: Option<u16>,
    ) -> Result<Self, ValidationError> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(ValidationError::empty_field("proxy.host"));
        }
        if host
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '@')
        {
            return Err(ValidationError::invalid_format(
                "proxy.host",
                "host must be a bare hostname or address",
            ));
        }
        if port == Some(0) {
            return Err(ValidationError::invalid_format("proxy.port", "port must be non-zero"));
        }
        Ok(Self { scheme, host, port })
    }

    /// Parses `scheme://host[:port]`.
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ValidationError::invalid_format("proxy", "expected scheme://host"))?;
        let scheme: ProxyScheme = scheme.parse()?;
        let rest = rest.trim_end_matches('/');
        match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    ValidationError::invalid_format("proxy.port", format!("invalid port '{}'", port))
                })?;
                Self::new(scheme, host, Some(port))
            }
            None => Self::new(scheme, rest, None),
        }
    }

    pub fn scheme(&self) -> ProxyScheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl fmt::Display for ProxyConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, port),
            None => write!(f, "{}://{}", self.scheme.as_str(), self.host),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// WebhookEndpoint
// ════════════════════════════════════════════════════════════════════════════

/// Destination URL for webhook payloads built from session data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebhookEndpoint(String);

impl WebhookEndpoint {
    pub fn new(url: impl Into<String>) -> Result<Self, ValidationError> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(ValidationError::empty_field("webhook"));
        }
        if url.len() > MAX_WEBHOOK_LENGTH {
            return Err(ValidationError::invalid_length(
                "webhook",
                1,
                MAX_WEBHOOK_LENGTH,
                url.len(),
            ));
        }
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| {
                ValidationError::invalid_format("webhook", "must be an http or https URL")
            })?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(ValidationError::invalid_format("webhook", "missing host"));
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WebhookEndpoint {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WebhookEndpoint> for String {
    fn from(value: WebhookEndpoint) -> Self {
        value.0
    }
}
