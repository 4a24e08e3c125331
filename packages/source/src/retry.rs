//! Rate-limited HTTP fetching with retry for transient errors.
//!
//! Every request to the dictionary source goes through
//! [`RetryingFetcher::fetch`], which acquires the shared
//! [`RateLimiter`] before each attempt and retries transient failures
//! (HTTP 429, HTTP 5xx, network errors) with jittered exponential
//! backoff. HTTP 404 and other 4xx responses are permanent and are
//! returned after a single attempt.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use strum_macros::{AsRefStr, Display};

use crate::rate_limit::RateLimiter;
use crate::transport::{HttpTransport, TransportError};

/// Backoff schedule: `min(initial_delay * 2^attempt, max_delay)` plus up
/// to `jitter_ratio` of that delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the exponential component.
    pub max_delay: Duration,
    /// Maximum jitter as a fraction of the exponential component.
    pub jitter_ratio: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            jitter_ratio: 0.3,
        }
    }
}

impl BackoffPolicy {
    /// The exponential component of the delay before retry number
    /// `attempt + 1` (so `attempt` 0 yields `initial_delay`).
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// The delay for `attempt` with jitter `sample` (in `0.0..=1.0`)
    /// scaled by `jitter_ratio`.
    #[must_use]
    pub fn jittered_delay(&self, attempt: u32, sample: f64) -> Duration {
        let base = self.base_delay(attempt);
        base + base.mul_f64(self.jitter_ratio * sample.clamp(0.0, 1.0))
    }

    /// The delay for `attempt` with random jitter.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let sample: f64 = rand::thread_rng().gen_range(0.0..=1.0);
        self.jittered_delay(attempt, sample)
    }
}

/// Failure category, used for logging and for the orchestrator's
/// absent-versus-gave-up decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchErrorKind {
    /// HTTP 404.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// No response was received.
    NetworkError,
    /// Any other non-2xx status.
    UnexpectedStatus,
    /// Transient failures persisted through every retry.
    RetriesExhausted,
}

/// Errors from [`RetryingFetcher::fetch`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The resource does not exist (HTTP 404).
    #[error("Not found: {url}")]
    NotFound {
        /// Requested URL.
        url: String,
    },

    /// The host asked us to slow down (HTTP 429).
    #[error("Rate limited (HTTP 429): {url}")]
    RateLimited {
        /// Requested URL.
        url: String,
    },

    /// The host failed (HTTP 5xx).
    #[error("Server error (HTTP {status}): {url}")]
    ServerError {
        /// Requested URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// No response was received.
    #[error("Network error for {url}: {source}")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying transport failure.
        source: TransportError,
    },

    /// A non-2xx status that is neither 404, 429 nor 5xx.
    #[error("Unexpected HTTP {status}: {url}")]
    UnexpectedStatus {
        /// Requested URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// Every attempt failed with a transient error.
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// The final attempt's error.
        last: Box<Self>,
    },
}

impl FetchError {
    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::NotFound { .. } => FetchErrorKind::NotFound,
            Self::RateLimited { .. } => FetchErrorKind::RateLimited,
            Self::ServerError { .. } => FetchErrorKind::ServerError,
            Self::Network { .. } => FetchErrorKind::NetworkError,
            Self::UnexpectedStatus { .. } => FetchErrorKind::UnexpectedStatus,
            Self::RetriesExhausted { .. } => FetchErrorKind::RetriesExhausted,
        }
    }

    /// Returns `true` if another attempt might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::ServerError { .. } => true,
            Self::Network { source, .. } => source.is_transient(),
            Self::NotFound { .. }
            | Self::UnexpectedStatus { .. }
            | Self::RetriesExhausted { .. } => false,
        }
    }
}

/// Fetches URLs through a shared rate limiter, retrying transient
/// failures.
#[derive(Clone)]
pub struct RetryingFetcher {
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<RateLimiter>,
    policy: BackoffPolicy,
}

impl std::fmt::Debug for RetryingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryingFetcher {
    /// Creates a fetcher over `transport`, pacing requests with `limiter`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<RateLimiter>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            transport,
            limiter,
            policy,
        }
    }

    /// The retry policy in use.
    #[must_use]
    pub const fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Fetches `url` and returns the body of the first 2xx response.
    ///
    /// Makes at most `1 + max_retries` attempts, acquiring the rate
    /// limiter before each one.
    ///
    /// # Errors
    ///
    /// * [`FetchError::NotFound`] / [`FetchError::UnexpectedStatus`] on a
    ///   permanent HTTP status, after one attempt
    /// * [`FetchError::Network`] if the transport failed non-transiently
    /// * [`FetchError::RetriesExhausted`] if every attempt hit a transient
    ///   failure
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let max_retries = self.policy.max_retries;
        let mut attempt = 0;

        loop {
            self.limiter.acquire().await;

            let err = match self.attempt(url).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt >= max_retries {
                log::error!("  {err}; giving up after {} attempts", attempt + 1);
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay(attempt);
            attempt += 1;
            log::warn!("  {err}; retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let url = url.to_string();
        match response.status {
            200..=299 => Ok(response.body),
            404 => Err(FetchError::NotFound { url }),
            429 => Err(FetchError::RateLimited { url }),
            status @ 500..=599 => Err(FetchError::ServerError { url, status }),
            status => Err(FetchError::UnexpectedStatus { url, status }),
        }
    }
}
