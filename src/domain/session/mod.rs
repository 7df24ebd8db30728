//! Session domain module.
//!
//! A session tracks one external device-pairing context and its connection
//! state. The aggregate enforces the connection state machine and stages one
//! typed event per successful mutation.
//!
//! # Events
//!
//! - `session.created` - a session was created
//! - `session.connected` - a connection attempt started
//! - `session.authenticated` - the device finished pairing
//! - `session.disconnected` - the session was disconnected
//! - `session.error` - the connection failed
//! - `session.pairing_code_issued` - a fresh pairing code is available
//! - `session.configuration_changed` - proxy, webhook, api key or device changed
//! - `session.deleted` - the session was tombstoned

mod aggregate;
mod errors;
mod events;
mod policy;
mod status;
mod values;

pub use aggregate::{NewSession, Session, SessionFactory, SessionRecord};
pub use errors::SessionError;
pub use events::{ConfigurationField, SessionEvent, SESSION_AGGREGATE_TYPE};
pub use policy::SessionPolicy;
pub use status::SessionStatus;
pub use values::{
    ApiKey, DeviceIdentifier, PairingCode, ProxyConfiguration, ProxyScheme, SessionName,
    WebhookEndpoint, MAX_API_KEY_LENGTH, MAX_DEVICE_IDENTIFIER_LENGTH, MAX_NAME_LENGTH,
    MAX_PAIRING_CODE_LENGTH, MAX_WEBHOOK_LENGTH, MIN_API_KEY_LENGTH, MIN_NAME_LENGTH,
};
