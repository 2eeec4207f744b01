//! Orchestrator configuration.

use crate::error::ConfigError;
use crate::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use std::env;
use std::time::Duration;

/// Environment variable holding the push attempt limit.
pub const ENV_MAX_RETRIES: &str = "CANON_SYNC_MAX_RETRIES";

/// Environment variable holding the backoff unit in milliseconds.
pub const ENV_RETRY_BASE_DELAY_MS: &str = "CANON_SYNC_RETRY_BASE_DELAY_MS";

/// Settings accepted by [`crate::SyncOrchestrator::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Total push attempts per sync, including the first (>= 1)
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_base_delay` after failing
    pub retry_base_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl SyncConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries < 1 {
            return Err(ConfigError::InvalidMaxRetries(self.max_retries));
        }
        Ok(())
    }

    /// Retry policy for pushes.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay)
    }

    /// Load configuration from environment variables, falling back to the
    /// defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            config.max_retries = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: ENV_MAX_RETRIES,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(ENV_RETRY_BASE_DELAY_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: ENV_RETRY_BASE_DELAY_MS,
                value: raw.clone(),
            })?;
            config.retry_base_delay = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}
