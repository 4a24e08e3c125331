//! HTTP transport seam.
//!
//! [`RetryingFetcher`](crate::retry::RetryingFetcher) talks to the network
//! only through [`HttpTransport`], so the retry and rate-limit policy can
//! be exercised against a scripted transport without a network.

use std::time::Duration;

use async_trait::async_trait;

/// Per-request timeout for the reqwest transport.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised below the HTTP status layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP client failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A connection-level failure reported without a client error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },
}

impl TransportError {
    /// Returns `true` if the error is likely transient and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
            }
            Self::Network { .. } => true,
        }
    }
}

/// A completed HTTP exchange: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs a single HTTP GET. Implementations must not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetches `url`, returning the status and body for any status code.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no response was received.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a client that sends `user_agent` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the client cannot be constructed.
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_transient() {
        let err = TransportError::Network {
            message: "connection reset".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn builds_client_with_user_agent() {
        assert!(ReqwestTransport::new("Lexicon/1.0 (test; contact: a@b.c)").is_ok());
    }
}
