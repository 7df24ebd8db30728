//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `SESSION_GATEWAY` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use session_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod cache;
mod database;
mod error;
mod logging;
mod startup;

pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use startup::StartupConfig;

use serde::Deserialize;

/// Root configuration. Only `database` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL session store
    pub database: DatabaseConfig,

    /// Session cache (Redis or disabled)
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub startup: StartupConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// A `.env` file is read first when present.
    ///
    /// # Environment Variable Format
    ///
    /// - `SESSION_GATEWAY__DATABASE__URL=...` -> `database.url`
    /// - `SESSION_GATEWAY__CACHE__ENABLED=false` -> `cache.enabled`
    /// - `SESSION_GATEWAY__CACHE__SESSION_TTL_SECS=600` -> `cache.session_ttl_secs`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SESSION_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.cache.validate()?;
        self.logging.validate()?;
        self.startup.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "SESSION_GATEWAY__DATABASE__URL",
        "SESSION_GATEWAY__CACHE__URL",
        "SESSION_GATEWAY__CACHE__ENABLED",
        "SESSION_GATEWAY__CACHE__SESSION_TTL_SECS",
        "SESSION_GATEWAY__LOGGING__JSON",
        "SESSION_GATEWAY__STARTUP__RESUME_TIMEOUT_SECS",
    ];

    fn set_minimal_env() {
        env::set_var(
            "SESSION_GATEWAY__DATABASE__URL",
            "postgresql://test@localhost/sessions",
        );
        env::set_var("SESSION_GATEWAY__CACHE__URL", "redis://localhost:6379");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_minimal_environment_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.database.url.expose_secret(),
            "postgresql://test@localhost/sessions"
        );
        assert!(config.cache.enabled);
        assert_eq!(config.cache.key_prefix, "sessiongw");
        assert_eq!(config.logging.level, "info");
        assert!(config.startup.resume_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_overrides_are_parsed() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        set_minimal_env();
        env::set_var("SESSION_GATEWAY__CACHE__SESSION_TTL_SECS", "600");
        env::set_var("SESSION_GATEWAY__LOGGING__JSON", "true");
        env::set_var("SESSION_GATEWAY__STARTUP__RESUME_TIMEOUT_SECS", "15");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.cache.ttls().session, Duration::from_secs(600));
        assert!(config.logging.json);
        assert_eq!(config.startup.resume_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn disabled_cache_needs_no_url() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        env::set_var(
            "SESSION_GATEWAY__DATABASE__URL",
            "postgresql://test@localhost/sessions",
        );
        env::set_var("SESSION_GATEWAY__CACHE__ENABLED", "false");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(!config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_database_url_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();
        assert!(matches!(AppConfig::load(), Err(ConfigError::LoadError(_))));
    }
}
