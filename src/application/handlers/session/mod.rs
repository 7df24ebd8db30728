//! Session command and query handlers.
//!
//! Every command follows the same path: validate input, load, check policy,
//! mutate the aggregate, write through the repository, then publish the
//! staged events.

mod connect_session;
mod create_session;
mod delete_session;
mod disconnect_session;
mod event_flush;
mod get_session;
mod list_sessions;
mod mark_authenticated;
mod pairing_code;
mod regenerate_api_key;
mod report_session_error;
mod resume_sessions;
mod services;
mod update_configuration;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_session::{ConnectSessionCommand, ConnectSessionHandler, ConnectSessionResult};
pub use create_session::{CreateSessionCommand, CreateSessionHandler, CreateSessionResult};
pub use delete_session::{DeleteSessionCommand, DeleteSessionHandler, DeleteSessionResult};
pub use disconnect_session::{
    DisconnectSessionCommand, DisconnectSessionHandler, DisconnectSessionResult,
};
pub use event_flush::flush_session_events;
pub use get_session::{GetSessionHandler, GetSessionQuery};
pub use list_sessions::{ListSessionsHandler, ListSessionsQuery};
pub use mark_authenticated::{
    MarkAuthenticatedCommand, MarkAuthenticatedHandler, MarkAuthenticatedResult,
};
pub use pairing_code::{
    GetPairingCodeHandler, GetPairingCodeQuery, RequestPairingCodeCommand,
    RequestPairingCodeHandler, SetPairingCodeCommand, SetPairingCodeHandler,
    SetPairingCodeResult,
};
pub use regenerate_api_key::{
    RegenerateApiKeyCommand, RegenerateApiKeyHandler, RegenerateApiKeyResult,
};
pub use report_session_error::{
    ReportSessionErrorCommand, ReportSessionErrorHandler, ReportSessionErrorResult,
};
pub use resume_sessions::{ResumeReport, ResumeSessionsHandler, DEFAULT_RESUME_CONCURRENCY};
pub use services::SessionServices;
pub use update_configuration::{
    UpdateConfigurationCommand, UpdateConfigurationHandler, UpdateConfigurationResult,
};
