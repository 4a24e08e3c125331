#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistence for the lexicon migration.
//!
//! [`LexiconStore`] is the seam the orchestrator writes through.
//! [`store::DuckDbStore`] implements it over a single `DuckDB` file at
//! [`paths::db_path`].

pub mod paths;
pub mod store;

use lexicon_models::{CoverageStats, LexicalRecord, MissingKind, VocabularyEntry};

pub use store::{DuckDbStore, StoreCounts};

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (creating the data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding of a stored column failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored value could not be converted to its model type.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Storage operations required by the migration.
///
/// Every vocabulary entry ends in at most one terminal outcome: a
/// [`LexicalRecord`] or a missing marker, never both.
pub trait LexiconStore {
    /// Inserts or replaces the record for `record.entry_id`, removing any
    /// missing marker for the entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    fn upsert_lexical_record(&mut self, record: &LexicalRecord) -> Result<(), DbError>;

    /// Records that no data will be fetched for `entry_id`. A no-op if a
    /// marker already exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    fn mark_missing(
        &mut self,
        entry_id: &str,
        kind: MissingKind,
        reason: &str,
    ) -> Result<(), DbError>;

    /// Returns entries with neither a record nor a marker, ordered by
    /// headword.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    fn list_unmigrated_entries(&self) -> Result<Vec<VocabularyEntry>, DbError>;

    /// Counts records, records with etymology and records with examples.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    fn compute_coverage_stats(&self) -> Result<CoverageStats, DbError>;
}

impl<T: LexiconStore + ?Sized> LexiconStore for &mut T {
    fn upsert_lexical_record(&mut self, record: &LexicalRecord) -> Result<(), DbError> {
        (**self).upsert_lexical_record(record)
    }

    fn mark_missing(
        &mut self,
        entry_id: &str,
        kind: MissingKind,
        reason: &str,
    ) -> Result<(), DbError> {
        (**self).mark_missing(entry_id, kind, reason)
    }

    fn list_unmigrated_entries(&self) -> Result<Vec<VocabularyEntry>, DbError> {
        (**self).list_unmigrated_entries()
    }

    fn compute_coverage_stats(&self) -> Result<CoverageStats, DbError> {
        (**self).compute_coverage_stats()
    }
}
