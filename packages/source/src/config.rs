//! Source configuration.
//!
//! The defaults live in `wiktionary.toml`, embedded at compile time. The
//! client identification string can be overridden at runtime with
//! `LEXICON_USER_AGENT`.

use std::time::Duration;

use serde::Deserialize;

use crate::retry::BackoffPolicy;

/// Environment variable overriding [`SourceConfig::user_agent`].
pub const USER_AGENT_ENV: &str = "LEXICON_USER_AGENT";

const EMBEDDED_TOML: &str = include_str!("../wiktionary.toml");

/// Errors loading source configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("Invalid source configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is unusable.
    #[error("Invalid source configuration: {message}")]
    Invalid {
        /// What is wrong with the value.
        message: String,
    },
}

/// Endpoints, identity and pacing for the dictionary source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Unique identifier (e.g. `"wiktionary"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Language key in the structured summary response (e.g. `"en"`).
    pub language_code: String,
    /// Level-2 heading of the target language in the markup (e.g. `"English"`).
    pub language_heading: String,
    /// Base of the structured summary endpoint; the headword is appended.
    pub summary_url: String,
    /// Raw markup (action API) endpoint.
    pub markup_url: String,
    /// Base of the canonical human-readable page URL.
    pub page_url: String,
    /// Client identification sent on every request.
    pub user_agent: String,
    /// License string stamped on every record.
    pub license: String,
    /// Minimum spacing between requests to the source host.
    pub rate_limit_ms: u64,
    /// Maximum usage examples kept per entry.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
}

/// Retry section of the source configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Upper bound on the exponential delay (before jitter).
    pub max_delay_ms: u64,
    /// Maximum jitter added on top of the delay, as a fraction of it.
    pub jitter_ratio: f64,
}

const fn default_max_examples() -> usize {
    3
}

impl SourceConfig {
    /// Loads the embedded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded TOML is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED_TOML)
    }

    /// Loads the embedded configuration and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded TOML is malformed or an
    /// override is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::embedded()?;
        if let Ok(user_agent) = std::env::var(USER_AGENT_ENV) {
            config.user_agent = user_agent;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or fails validation.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "user_agent must identify the client".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_ratio) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "retry.jitter_ratio must be within 0..=1, got {}",
                    self.retry.jitter_ratio
                ),
            });
        }
        Ok(())
    }

    /// Minimum spacing between requests.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// The configured retry policy.
    #[must_use]
    pub const fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_retries: self.retry.max_retries,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            jitter_ratio: self.retry.jitter_ratio,
        }
    }
}
