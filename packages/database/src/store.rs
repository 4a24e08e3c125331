//! `DuckDB`-backed [`LexiconStore`].
//!
//! One file holds three tables: the read-only `vocabulary_entries` input
//! and the two terminal outcome tables, `lexical_records` and
//! `missing_markers`, both keyed by `entry_id`.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use lexicon_models::{
    CoverageStats, LexicalRecord, MissingKind, MissingMarker, VocabularyEntry,
};

use crate::{DbError, LexiconStore};

/// Row counts across all tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    /// Vocabulary entries.
    pub vocabulary: u64,
    /// Lexical records.
    pub records: u64,
    /// Markers of kind [`MissingKind::Absent`].
    pub absent: u64,
    /// Markers of kind [`MissingKind::GaveUp`].
    pub gave_up: u64,
}

impl StoreCounts {
    /// Entries with no terminal outcome yet.
    #[must_use]
    pub const fn unmigrated(&self) -> u64 {
        self.vocabulary
            .saturating_sub(self.records + self.absent + self.gave_up)
    }
}

/// A [`LexiconStore`] over a `DuckDB` connection.
pub struct DuckDbStore {
    conn: Connection,
}

impl std::fmt::Debug for DuckDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStore").finish_non_exhaustive()
    }
}

impl DuckDbStore {
    /// Opens (or creates) the store at `path` and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens the store at [`crate::paths::db_path`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open_default() -> Result<Self, DbError> {
        let path = crate::paths::db_path();
        log::debug!("Opening lexicon store at {}", path.display());
        Self::open(&path)
    }

    /// Opens a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or schema creation fails.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DbError> {
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts vocabulary entries, updating headword and tier for ids that
    /// already exist. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the insert fails.
    pub fn insert_vocabulary(&mut self, entries: &[VocabularyEntry]) -> Result<usize, DbError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO vocabulary_entries (id, headword, difficulty_tier)
                 VALUES (?, ?, ?)
                 ON CONFLICT (id) DO UPDATE SET
                    headword = EXCLUDED.headword,
                    difficulty_tier = EXCLUDED.difficulty_tier",
            )?;
            for entry in entries {
                written += stmt.execute(duckdb::params![
                    entry.id,
                    entry.headword,
                    entry.difficulty_tier
                ])?;
            }
        }
        tx.commit()?;

        Ok(written)
    }

    /// Looks up vocabulary entries by headword, ordered by headword.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub fn entries_by_headword(&self, headwords: &[String]) -> Result<Vec<VocabularyEntry>, DbError> {
        if headwords.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = headwords.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT id, headword, difficulty_tier FROM vocabulary_entries
             WHERE headword IN ({placeholders})
             ORDER BY headword"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        for (i, headword) in headwords.iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, headword)?;
        }

        stmt.raw_execute()?;
        let mut rows = stmt.raw_query();
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(VocabularyEntry {
                id: row.get(0)?,
                headword: row.get(1)?,
                difficulty_tier: row.get(2)?,
            });
        }

        Ok(entries)
    }

    /// Deletes the missing markers of the given headwords so the next run
    /// retries them. Returns the number of markers removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the delete fails.
    pub fn clear_missing_markers(&mut self, headwords: &[String]) -> Result<usize, DbError> {
        let entries = self.entries_by_headword(headwords)?;
        if entries.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM missing_markers WHERE entry_id = ?")?;
            for entry in &entries {
                removed += stmt.execute([&entry.id])?;
            }
        }
        tx.commit()?;

        Ok(removed)
    }

    /// Deletes every marker of kind [`MissingKind::GaveUp`]. Returns the
    /// headwords whose markers were removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query or delete fails.
    pub fn clear_gave_up_markers(&mut self) -> Result<Vec<String>, DbError> {
        let headwords = {
            let mut stmt = self.conn.prepare(
                "SELECT v.headword FROM missing_markers m
                 JOIN vocabulary_entries v ON v.id = m.entry_id
                 WHERE m.kind = ?
                 ORDER BY v.headword",
            )?;
            let rows = stmt.query_map([MissingKind::GaveUp.as_ref()], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()?
        };

        let removed = self.conn.execute(
            "DELETE FROM missing_markers WHERE kind = ?",
            [MissingKind::GaveUp.as_ref()],
        )?;
        log::debug!("Cleared {removed} gave-up markers");

        Ok(headwords)
    }

    /// Returns the record for `entry_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a stored value is invalid.
    pub fn record_for(&self, entry_id: &str) -> Result<Option<LexicalRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, pronunciation, part_of_speech, definition, etymology,
                    examples, source_url, license, retrieved_at::TEXT
             FROM lexical_records WHERE entry_id = ?",
        )?;
        let result = stmt.query_row([entry_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        });

        let (
            entry_id,
            pronunciation,
            part_of_speech,
            definition,
            etymology,
            examples,
            source_url,
            license,
            retrieved_at,
        ) = match result {
            Ok(row) => row,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(DbError::DuckDb(e)),
        };

        Ok(Some(LexicalRecord {
            entry_id,
            pronunciation,
            part_of_speech,
            definition,
            etymology,
            examples: serde_json::from_str(&examples)?,
            source_url,
            license,
            retrieved_at: parse_timestamp(&retrieved_at)?,
        }))
    }

    /// Returns the missing marker for `entry_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a stored value is invalid.
    pub fn marker_for(&self, entry_id: &str) -> Result<Option<MissingMarker>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, kind, reason, marked_at::TEXT
             FROM missing_markers WHERE entry_id = ?",
        )?;
        let result = stmt.query_row([entry_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        });

        let (entry_id, kind, reason, marked_at) = match result {
            Ok(row) => row,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(DbError::DuckDb(e)),
        };

        let kind = MissingKind::from_str(&kind).map_err(|_| DbError::Conversion {
            message: format!("unknown missing kind {kind:?} for entry {entry_id}"),
        })?;

        Ok(Some(MissingMarker {
            entry_id,
            kind,
            reason,
            marked_at: parse_timestamp(&marked_at)?,
        }))
    }

    /// Counts rows in every table.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a query fails.
    pub fn counts(&self) -> Result<StoreCounts, DbError> {
        let (vocabulary, records, absent, gave_up): (i64, i64, i64, i64) = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM vocabulary_entries),
                (SELECT COUNT(*) FROM lexical_records),
                (SELECT COUNT(*) FROM missing_markers WHERE kind = ?),
                (SELECT COUNT(*) FROM missing_markers WHERE kind = ?)",
            [MissingKind::Absent.as_ref(), MissingKind::GaveUp.as_ref()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(StoreCounts {
            vocabulary: to_count(vocabulary)?,
            records: to_count(records)?,
            absent: to_count(absent)?,
            gave_up: to_count(gave_up)?,
        })
    }
}

impl LexiconStore for DuckDbStore {
    fn upsert_lexical_record(&mut self, record: &LexicalRecord) -> Result<(), DbError> {
        let examples = serde_json::to_string(&record.examples)?;
        let example_count = i64::try_from(record.examples.len()).map_err(|_| DbError::Conversion {
            message: format!("too many examples for entry {}", record.entry_id),
        })?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO lexical_records (
                entry_id, pronunciation, part_of_speech, definition, etymology,
                examples, example_count, source_url, license, retrieved_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))
            ON CONFLICT (entry_id) DO UPDATE SET
                pronunciation = EXCLUDED.pronunciation,
                part_of_speech = EXCLUDED.part_of_speech,
                definition = EXCLUDED.definition,
                etymology = EXCLUDED.etymology,
                examples = EXCLUDED.examples,
                example_count = EXCLUDED.example_count,
                source_url = EXCLUDED.source_url,
                license = EXCLUDED.license,
                retrieved_at = EXCLUDED.retrieved_at",
            duckdb::params![
                record.entry_id,
                record.pronunciation.as_deref(),
                record.part_of_speech,
                record.definition,
                record.etymology.as_deref(),
                examples,
                example_count,
                record.source_url,
                record.license,
                format_timestamp(&record.retrieved_at),
            ],
        )?;
        tx.execute(
            "DELETE FROM missing_markers WHERE entry_id = ?",
            [&record.entry_id],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn mark_missing(
        &mut self,
        entry_id: &str,
        kind: MissingKind,
        reason: &str,
    ) -> Result<(), DbError> {
        let inserted = self.conn.execute(
            "INSERT INTO missing_markers (entry_id, kind, reason, marked_at)
             VALUES (?, ?, ?, CAST(? AS TIMESTAMP))
             ON CONFLICT (entry_id) DO NOTHING",
            duckdb::params![entry_id, kind.as_ref(), reason, format_timestamp(&Utc::now())],
        )?;

        if inserted == 0 {
            log::debug!("Entry {entry_id} already marked missing");
        }

        Ok(())
    }

    fn list_unmigrated_entries(&self) -> Result<Vec<VocabularyEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT v.id, v.headword, v.difficulty_tier
             FROM vocabulary_entries v
             WHERE NOT EXISTS (SELECT 1 FROM lexical_records r WHERE r.entry_id = v.id)
               AND NOT EXISTS (SELECT 1 FROM missing_markers m WHERE m.entry_id = v.id)
             ORDER BY v.headword",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(VocabularyEntry {
                id: row.get(0)?,
                headword: row.get(1)?,
                difficulty_tier: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn compute_coverage_stats(&self) -> Result<CoverageStats, DbError> {
        let (total, with_etymology, with_examples): (i64, i64, i64) = self.conn.query_row(
            "SELECT
                COUNT(*),
                COUNT(etymology),
                COUNT(*) FILTER (WHERE example_count > 0)
             FROM lexical_records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(CoverageStats {
            total: to_count(total)?,
            with_etymology: to_count(with_etymology)?,
            with_examples: to_count(with_examples)?,
        })
    }
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS vocabulary_entries (
            id TEXT NOT NULL PRIMARY KEY,
            headword TEXT NOT NULL,
            difficulty_tier UTINYINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS lexical_records (
            entry_id TEXT NOT NULL PRIMARY KEY,
            pronunciation TEXT,
            part_of_speech TEXT NOT NULL,
            definition TEXT NOT NULL,
            etymology TEXT,
            examples TEXT NOT NULL,
            example_count INTEGER NOT NULL,
            source_url TEXT NOT NULL,
            license TEXT NOT NULL,
            retrieved_at TIMESTAMP NOT NULL
        );

        CREATE TABLE IF NOT EXISTS missing_markers (
            entry_id TEXT NOT NULL PRIMARY KEY,
            kind TEXT NOT NULL,
            reason TEXT NOT NULL,
            marked_at TIMESTAMP NOT NULL
        );",
    )?;

    Ok(())
}

fn to_count(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_| DbError::Conversion {
        message: format!("negative row count {value}"),
    })
}

/// Timestamps are stored as naive UTC `TIMESTAMP` values.
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parses `DuckDB`'s `::TEXT` rendering of a `TIMESTAMP`, with or without
/// fractional seconds.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .map_err(|e| DbError::Conversion {
            message: format!("invalid timestamp {s:?}: {e}"),
        })
}
