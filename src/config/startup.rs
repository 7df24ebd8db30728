//! Startup behaviour

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Controls the background resume of live sessions after a restart.
#[derive(Debug, Clone, Deserialize)]
pub struct StartupConfig {
    #[serde(default = "default_resume_enabled")]
    pub resume_enabled: bool,

    /// Overall deadline for the resume pass in seconds
    #[serde(default = "default_resume_timeout")]
    pub resume_timeout_secs: u64,

    /// Sessions dialled at once during resume
    #[serde(default = "default_resume_concurrency")]
    pub resume_concurrency: usize,
}

impl StartupConfig {
    pub fn resume_timeout(&self) -> Duration {
        Duration::from_secs(self.resume_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resume_enabled && self.resume_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout("session resume"));
        }
        Ok(())
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            resume_enabled: default_resume_enabled(),
            resume_timeout_secs: default_resume_timeout(),
            resume_concurrency: default_resume_concurrency(),
        }
    }
}

fn default_resume_enabled() -> bool {
    true
}

fn default_resume_timeout() -> u64 {
    120
}

fn default_resume_concurrency() -> usize {
    crate::application::handlers::session::DEFAULT_RESUME_CONCURRENCY
}
