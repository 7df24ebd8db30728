//! Application layer - Commands, Queries, and Handlers.
//!
//! Orchestrates the session aggregate, the policy service and the ports.
//! Handlers never talk to a cache directly except for pairing codes; all
//! session reads and writes go through `SessionRepository`.

pub mod handlers;

pub use handlers::session::{
    ConnectSessionCommand, ConnectSessionHandler, CreateSessionCommand, CreateSessionHandler,
    DeleteSessionCommand, DeleteSessionHandler, DisconnectSessionCommand,
    DisconnectSessionHandler, GetPairingCodeHandler, GetSessionHandler, GetSessionQuery,
    ListSessionsHandler, ListSessionsQuery, MarkAuthenticatedCommand, MarkAuthenticatedHandler,
    RegenerateApiKeyCommand, RegenerateApiKeyHandler, ReportSessionErrorCommand,
    ReportSessionErrorHandler, RequestPairingCodeHandler, ResumeReport, ResumeSessionsHandler,
    SessionServices, SetPairingCodeHandler, UpdateConfigurationCommand,
    UpdateConfigurationHandler,
};
