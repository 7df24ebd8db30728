//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid cache URL format")]
    InvalidCacheUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("TTL for {0} must be greater than zero")]
    ZeroTtl(&'static str),

    #[error("Invalid cache key prefix")]
    InvalidKeyPrefix,

    #[error("Timeout for {0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("Unknown log level '{0}'")]
    InvalidLogLevel(String),
}
