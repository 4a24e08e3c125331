#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dictionary source client.
//!
//! Requests flow through three layers:
//!
//! * [`transport::HttpTransport`] performs one GET
//! * [`retry::RetryingFetcher`] paces attempts through a shared
//!   [`rate_limit::RateLimiter`] and retries transient failures
//! * [`wiktionary::DefinitionFetcher`] combines the definition summary
//!   and page markup into a [`lexicon_models::NormalizedEntry`]

pub mod config;
pub mod progress;
pub mod rate_limit;
pub mod retry;
pub mod transport;
pub mod wiktionary;

pub use config::{ConfigError, SourceConfig};
pub use rate_limit::RateLimiter;
pub use retry::{BackoffPolicy, FetchError, FetchErrorKind, RetryingFetcher};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use wiktionary::{DefinitionError, DefinitionFetcher, DefinitionSummary};
