//! Wiktionary definition assembly.
//!
//! A headword is resolved with two calls through the shared
//! [`RetryingFetcher`]:
//!
//! 1. The structured definition summary (REST `page/definition`), which
//!    yields part of speech, the first definition and usage examples
//! 2. The raw page markup (action API `revisions`), from which the
//!    [`MarkupExtractor`] pulls etymology prose and pronunciation
//!
//! The summary is required. Markup failures only cost the etymology.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use lexicon_markup::MarkupExtractor;
use lexicon_models::NormalizedEntry;
use regex::Regex;
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::SourceConfig;
use crate::rate_limit::RateLimiter;
use crate::retry::{FetchError, FetchErrorKind, RetryingFetcher};
use crate::transport::HttpTransport;

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Errors resolving a headword.
#[derive(Debug, thiserror::Error, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DefinitionError {
    /// The source has no page for the headword.
    #[error("No entry exists for '{headword}'")]
    NotFound {
        /// Requested headword.
        headword: String,
    },

    /// The page exists but has no usable definition in the target language.
    #[error("No {language} definition found for '{headword}'")]
    NoDefinition {
        /// Requested headword.
        headword: String,
        /// Target language key.
        language: String,
    },

    /// The source could not be reached or kept failing.
    #[error("Source unavailable for '{headword}': {source}")]
    SourceUnavailable {
        /// Requested headword.
        headword: String,
        /// Underlying fetch failure.
        source: FetchError,
    },

    /// A response could not be decoded.
    #[error("Malformed response for '{headword}': {message}")]
    Malformed {
        /// Requested headword.
        headword: String,
        /// Decoder message.
        message: String,
    },
}

impl DefinitionError {
    /// Returns `true` if the headword is known to have no usable entry,
    /// as opposed to the source failing.
    #[must_use]
    pub const fn is_absence(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoDefinition { .. })
    }

    /// The fetch failure category behind this error, if any.
    #[must_use]
    pub const fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::NotFound { .. } => Some(FetchErrorKind::NotFound),
            Self::SourceUnavailable { source, .. } => Some(source.kind()),
            Self::NoDefinition { .. } | Self::Malformed { .. } => None,
        }
    }

    fn from_fetch(headword: &str, error: FetchError) -> Self {
        match error {
            FetchError::NotFound { .. } => Self::NotFound {
                headword: headword.to_string(),
            },
            source => Self::SourceUnavailable {
                headword: headword.to_string(),
                source,
            },
        }
    }
}

/// Fields taken from the structured definition summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSummary {
    /// Part of speech of the first sense.
    pub part_of_speech: String,
    /// First definition of the first sense, HTML stripped.
    pub definition: String,
    /// Usage examples gathered across senses in order.
    pub examples: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummarySense {
    #[serde(default)]
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<SummaryDefinition>,
}

#[derive(Debug, Deserialize)]
struct SummaryDefinition {
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    examples: Option<Vec<String>>,
}

/// Strips HTML tags and collapses whitespace.
fn strip_html(text: &str) -> String {
    let text = HTML_TAG_RE.replace_all(text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Decodes a definition summary body for `language`.
///
/// Returns `Ok(None)` when the body is valid but carries no usable
/// definition for the language.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the body is not the expected JSON
/// shape.
pub fn parse_summary(
    body: &str,
    language: &str,
    max_examples: usize,
) -> Result<Option<DefinitionSummary>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let Some(senses) = value.get(language) else {
        return Ok(None);
    };
    let senses: Vec<SummarySense> = serde_json::from_value(senses.clone())?;

    let Some(first) = senses.first() else {
        return Ok(None);
    };
    let definition = first
        .definitions
        .first()
        .and_then(|d| d.definition.as_deref())
        .map(strip_html)
        .unwrap_or_default();
    if definition.is_empty() {
        return Ok(None);
    }

    let examples = senses
        .iter()
        .flat_map(|sense| &sense.definitions)
        .flat_map(|d| d.examples.iter().flatten())
        .map(|example| strip_html(example))
        .filter(|example| !example.is_empty())
        .take(max_examples)
        .collect();

    Ok(Some(DefinitionSummary {
        part_of_speech: first.part_of_speech.clone().unwrap_or_default(),
        definition,
        examples,
    }))
}

/// Decodes an action-API revisions body into the page's wikitext.
///
/// Returns `Ok(None)` when the page is flagged `missing` or `invalid`, or
/// carries no revision content.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if the body is not JSON.
pub fn parse_markup_response(body: &str) -> Result<Option<String>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    let page = match value.pointer("/query/pages") {
        Some(serde_json::Value::Object(pages)) => pages.values().next(),
        Some(serde_json::Value::Array(pages)) => pages.first(),
        _ => None,
    };
    let Some(page) = page else {
        return Ok(None);
    };

    if page.get("missing").is_some() || page.get("invalid").is_some() {
        return Ok(None);
    }

    let content = page
        .pointer("/revisions/0/slots/main")
        .and_then(|main| main.get("*").or_else(|| main.get("content")))
        .or_else(|| page.pointer("/revisions/0/*"))
        .and_then(serde_json::Value::as_str);

    Ok(content.map(str::to_string))
}

/// Resolves headwords into [`NormalizedEntry`] values.
#[derive(Debug, Clone)]
pub struct DefinitionFetcher {
    fetcher: RetryingFetcher,
    extractor: MarkupExtractor,
    config: Arc<SourceConfig>,
}

impl DefinitionFetcher {
    /// Creates a fetcher that issues requests through `fetcher`.
    #[must_use]
    pub fn new(fetcher: RetryingFetcher, config: SourceConfig) -> Self {
        Self {
            extractor: MarkupExtractor::new(config.language_heading.clone()),
            fetcher,
            config: Arc::new(config),
        }
    }

    /// Creates a fetcher with its own rate limiter and the configured
    /// retry policy.
    #[must_use]
    pub fn from_config(config: SourceConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit()));
        let fetcher = RetryingFetcher::new(transport, limiter, config.backoff_policy());
        Self::new(fetcher, config)
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// URL of the structured definition summary for `headword`.
    #[must_use]
    pub fn summary_url(&self, headword: &str) -> String {
        format!(
            "{}/{}",
            self.config.summary_url.trim_end_matches('/'),
            urlencoding::encode(headword)
        )
    }

    /// URL of the raw markup query for `headword`.
    #[must_use]
    pub fn markup_url(&self, headword: &str) -> String {
        format!(
            "{}?action=query&prop=revisions&rvprop=content&rvslots=main&format=json&titles={}",
            self.config.markup_url,
            urlencoding::encode(headword)
        )
    }

    /// Canonical human-readable page URL for `headword`.
    #[must_use]
    pub fn page_url(&self, headword: &str) -> String {
        format!(
            "{}/{}",
            self.config.page_url.trim_end_matches('/'),
            urlencoding::encode(headword)
        )
    }

    /// Fetches the summary for `headword`.
    ///
    /// # Errors
    ///
    /// * [`DefinitionError::NotFound`] if the source has no page
    /// * [`DefinitionError::NoDefinition`] if the page has no usable
    ///   definition in the target language
    /// * [`DefinitionError::SourceUnavailable`] on any other fetch failure
    /// * [`DefinitionError::Malformed`] if the body cannot be decoded
    pub async fn fetch_summary(&self, headword: &str) -> Result<DefinitionSummary, DefinitionError> {
        let body = self
            .fetcher
            .fetch(&self.summary_url(headword))
            .await
            .map_err(|e| DefinitionError::from_fetch(headword, e))?;

        parse_summary(&body, &self.config.language_code, self.config.max_examples)
            .map_err(|e| DefinitionError::Malformed {
                headword: headword.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| DefinitionError::NoDefinition {
                headword: headword.to_string(),
                language: self.config.language_code.clone(),
            })
    }

    /// Fetches the raw wikitext for `headword`.
    ///
    /// # Errors
    ///
    /// * [`DefinitionError::NotFound`] on HTTP 404 or a `missing` page
    /// * [`DefinitionError::SourceUnavailable`] on any other fetch failure
    /// * [`DefinitionError::Malformed`] if the body cannot be decoded
    pub async fn fetch_markup(&self, headword: &str) -> Result<String, DefinitionError> {
        let body = self
            .fetcher
            .fetch(&self.markup_url(headword))
            .await
            .map_err(|e| DefinitionError::from_fetch(headword, e))?;

        parse_markup_response(&body)
            .map_err(|e| DefinitionError::Malformed {
                headword: headword.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| DefinitionError::NotFound {
                headword: headword.to_string(),
            })
    }

    /// Resolves `headword` into a normalized entry.
    ///
    /// The etymology and pronunciation are `None` when the markup fetch
    /// fails or yields nothing usable; that is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] if the summary cannot be obtained. See
    /// [`Self::fetch_summary`].
    pub async fn fetch(&self, headword: &str) -> Result<NormalizedEntry, DefinitionError> {
        let summary = self.fetch_summary(headword).await?;

        let (etymology, pronunciation) = match self.fetch_markup(headword).await {
            Ok(markup) => (
                self.extractor.extract_etymology(&markup).into_text(),
                self.extractor.extract_pronunciation(&markup),
            ),
            Err(e) => {
                log::warn!("Markup unavailable for '{headword}', storing without etymology: {e}");
                (None, None)
            }
        };

        if etymology.is_none() {
            log::debug!("No etymology extracted for '{headword}'");
        }

        Ok(NormalizedEntry {
            headword: headword.to_string(),
            pronunciation,
            part_of_speech: summary.part_of_speech,
            definition: summary.definition,
            etymology,
            examples: summary.examples,
            source_url: self.page_url(headword),
            license: self.config.license.clone(),
            retrieved_at: Utc::now(),
        })
    }
}
