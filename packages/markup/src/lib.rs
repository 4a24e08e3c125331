#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Etymology extraction from raw dictionary wikitext.
//!
//! Extraction is a staged pipeline with no I/O:
//!
//! 1. [`section::isolate_language_section`]: the `==English==` section
//! 2. [`section::find_subsection`]: the `===Etymology===` subsection
//! 3. [`normalize::normalize`]: templates, links, comments and
//!    whitespace reduced to plain prose
//!
//! Results of 10 characters or fewer are treated as absent; they are
//! almost always punctuation left behind by stripped templates.

pub mod languages;
pub mod normalize;
pub mod pronunciation;
pub mod section;
pub mod template;

/// Normalized etymologies this short (in characters) are rejected.
pub const MIN_ETYMOLOGY_CHARS: usize = 10;

/// Outcome of an etymology extraction. `found == false` is a valid
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    /// Whether usable etymology prose was found.
    pub found: bool,
    /// The normalized prose when `found` is true.
    pub text: Option<String>,
}

impl Extraction {
    /// An extraction that found nothing.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            found: false,
            text: None,
        }
    }

    /// An extraction carrying `text`.
    #[must_use]
    pub const fn found(text: String) -> Self {
        Self {
            found: true,
            text: Some(text),
        }
    }

    /// Consumes the extraction, returning the prose if any.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        self.text
    }
}

/// Extracts language-scoped lexical data from a wikitext document.
#[derive(Debug, Clone)]
pub struct MarkupExtractor {
    language: String,
}

impl Default for MarkupExtractor {
    fn default() -> Self {
        Self::new("English")
    }
}

impl MarkupExtractor {
    /// Creates an extractor for the section headed `==<language>==`.
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// The language heading this extractor targets.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Isolates the target-language section of `document`.
    #[must_use]
    pub fn language_section<'a>(&self, document: &'a str) -> Option<&'a str> {
        section::isolate_language_section(document, &self.language)
    }

    /// Returns the raw (un-normalized) etymology prose: the lead of the
    /// first `Etymology` / `Etymology N` subsection.
    #[must_use]
    pub fn raw_etymology<'a>(&self, document: &'a str) -> Option<&'a str> {
        let language_section = self.language_section(document)?;
        section::find_subsection(language_section, section::is_etymology_title)
            .map(|sub| sub.lead())
    }

    /// Runs the full extraction pipeline.
    #[must_use]
    pub fn extract_etymology(&self, document: &str) -> Extraction {
        let Some(raw) = self.raw_etymology(document) else {
            return Extraction::absent();
        };

        let text = normalize::normalize(raw);
        if text.chars().count() <= MIN_ETYMOLOGY_CHARS {
            return Extraction::absent();
        }

        Extraction::found(text)
    }

    /// Returns the IPA pronunciation from the target-language section.
    #[must_use]
    pub fn extract_pronunciation(&self, document: &str) -> Option<String> {
        pronunciation::extract_ipa(self.language_section(document)?)
    }
}
