#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core data types shared by the lexicon migration pipeline.
//!
//! A [`VocabularyEntry`] is the read-only input. Each entry ends in
//! exactly one terminal outcome: a [`LexicalRecord`] (data was found and
//! persisted) or a [`MissingMarker`] (the pipeline gave up on it).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A curated vocabulary word. Loaded once, never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    /// Stable identifier of the entry.
    pub id: String,
    /// Canonical spelling, used as the lookup key against the remote source.
    pub headword: String,
    /// Difficulty tier on a 1-10 scale.
    pub difficulty_tier: u8,
}

impl VocabularyEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(id: impl Into<String>, headword: impl Into<String>, difficulty_tier: u8) -> Self {
        Self {
            id: id.into(),
            headword: headword.into(),
            difficulty_tier,
        }
    }
}

/// Lexical metadata assembled for a headword, before it is bound to a
/// vocabulary entry id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEntry {
    /// The headword the data was fetched for.
    pub headword: String,
    /// IPA pronunciation, if the markup carried one.
    pub pronunciation: Option<String>,
    /// Part of speech of the first sense (e.g. `"Adjective"`).
    pub part_of_speech: String,
    /// Primary definition text.
    pub definition: String,
    /// Plain-prose etymology. `None` means the source has none.
    pub etymology: Option<String>,
    /// Up to three usage examples.
    pub examples: Vec<String>,
    /// Canonical human-readable page for the headword.
    pub source_url: String,
    /// License terms of the data.
    pub license: String,
    /// When the data was fetched.
    pub retrieved_at: DateTime<Utc>,
}

impl NormalizedEntry {
    /// Binds this entry to a vocabulary entry id, producing the persisted
    /// record.
    #[must_use]
    pub fn into_record(self, entry_id: impl Into<String>) -> LexicalRecord {
        LexicalRecord {
            entry_id: entry_id.into(),
            pronunciation: self.pronunciation,
            part_of_speech: self.part_of_speech,
            definition: self.definition,
            etymology: self.etymology,
            examples: self.examples,
            source_url: self.source_url,
            license: self.license,
            retrieved_at: self.retrieved_at,
        }
    }
}

/// The migration's output unit. At most one per vocabulary entry; keyed
/// by `entry_id` with upsert semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalRecord {
    /// The [`VocabularyEntry::id`] this record belongs to.
    pub entry_id: String,
    /// IPA pronunciation.
    pub pronunciation: Option<String>,
    /// Part of speech.
    pub part_of_speech: String,
    /// Primary definition text.
    pub definition: String,
    /// Plain-prose etymology. Absence is a valid, terminal state.
    pub etymology: Option<String>,
    /// Usage examples (0-3).
    pub examples: Vec<String>,
    /// Canonical page URL.
    pub source_url: String,
    /// License terms.
    pub license: String,
    /// When the data was fetched.
    pub retrieved_at: DateTime<Utc>,
}

/// Why an entry was marked missing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MissingKind {
    /// The source has no usable entry for the headword.
    Absent,
    /// The pipeline gave up after an error that may have been transient.
    GaveUp,
}

/// A terminal, non-retried failure to obtain data for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingMarker {
    /// The [`VocabularyEntry::id`] this marker belongs to.
    pub entry_id: String,
    /// Category of the failure.
    pub kind: MissingKind,
    /// Verbatim reason text (error message or absence description).
    pub reason: String,
    /// When the marker was written.
    pub marked_at: DateTime<Utc>,
}

/// Aggregate coverage over migrated records only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStats {
    /// Number of lexical records.
    pub total: u64,
    /// Records with a non-null etymology.
    pub with_etymology: u64,
    /// Records with at least one example.
    pub with_examples: u64,
}

impl CoverageStats {
    /// Percentage of records carrying an etymology, or `None` when no
    /// records exist.
    #[must_use]
    pub fn etymology_percent(&self) -> Option<f64> {
        percent(self.with_etymology, self.total)
    }

    /// Percentage of records carrying at least one example, or `None`
    /// when no records exist.
    #[must_use]
    pub fn examples_percent(&self) -> Option<f64> {
        percent(self.with_examples, self.total)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(part as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_percent_is_none_without_records() {
        let stats = CoverageStats::default();
        assert!(stats.etymology_percent().is_none());
        assert!(stats.examples_percent().is_none());
    }

    #[test]
    fn coverage_percent_uses_record_count_as_denominator() {
        let stats = CoverageStats {
            total: 4,
            with_etymology: 3,
            with_examples: 1,
        };
        assert!((stats.etymology_percent().unwrap() - 75.0).abs() < f64::EPSILON);
        assert!((stats.examples_percent().unwrap() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_kind_round_trips_through_strum() {
        assert_eq!(MissingKind::GaveUp.as_ref(), "GAVE_UP");
        assert_eq!("ABSENT".parse::<MissingKind>().unwrap(), MissingKind::Absent);
    }

    #[test]
    fn into_record_keeps_every_field() {
        let retrieved_at = Utc::now();
        let entry = NormalizedEntry {
            headword: "ephemeral".to_string(),
            pronunciation: Some("/ɪˈfɛm(ə)ɹəl/".to_string()),
            part_of_speech: "Adjective".to_string(),
            definition: "Lasting for a short period of time.".to_string(),
            etymology: Some("From Ancient Greek ἐφήμερος.".to_string()),
            examples: vec!["an ephemeral fad".to_string()],
            source_url: "https://en.wiktionary.org/wiki/ephemeral".to_string(),
            license: "CC BY-SA 3.0".to_string(),
            retrieved_at,
        };

        let record = entry.into_record("w-1");
        assert_eq!(record.entry_id, "w-1");
        assert_eq!(record.part_of_speech, "Adjective");
        assert_eq!(record.examples.len(), 1);
        assert_eq!(record.retrieved_at, retrieved_at);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["entryId"], "w-1");
    }
}
