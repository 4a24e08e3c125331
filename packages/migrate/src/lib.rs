#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Vocabulary migration driver.
//!
//! A [`MigrationOrchestrator`] performs one run: it derives the work set
//! from persisted state (entries with neither a record nor a missing
//! marker), resolves each headword sequentially through the shared
//! [`DefinitionFetcher`], persists the terminal outcome and reports
//! coverage. There is no checkpoint; an interrupted run is resumed by
//! starting a new one.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lexicon_database::{DbError, LexiconStore};
use lexicon_models::{CoverageStats, MissingKind, VocabularyEntry};
use lexicon_source::progress::{ProgressCallback, null_progress};
use lexicon_source::{
    ConfigError, DefinitionError, DefinitionFetcher, ReqwestTransport, SourceConfig,
    TransportError,
};
use strum_macros::Display;

/// Errors that abort a run or its setup.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The store failed while computing the work set or coverage.
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// Source configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A work-set limit of zero was requested.
    #[error("Limit must be at least 1")]
    InvalidLimit,
}

/// Builds a [`DefinitionFetcher`] from the embedded source configuration,
/// environment overrides and a reqwest transport.
///
/// # Errors
///
/// Returns [`MigrateError`] if the configuration or HTTP client is invalid.
pub fn definition_fetcher_from_env() -> Result<DefinitionFetcher, MigrateError> {
    let config = SourceConfig::from_env()?;
    let transport = Arc::new(ReqwestTransport::new(&config.user_agent)?);
    log::debug!("Using {} as {}", config.name, config.user_agent);
    Ok(DefinitionFetcher::from_config(config, transport))
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    /// Constructed, not yet started.
    Idle,
    /// Querying the store for unmigrated entries.
    ComputingWorkSet,
    /// Resolving entries one at a time.
    Processing,
    /// Computing coverage.
    Reporting,
    /// Finished. The orchestrator is consumed.
    Done,
}

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Caps the work set to its first `limit` entries (by headword).
    /// Must be at least 1 when set.
    pub limit: Option<usize>,
    /// Restricts the work set to these headwords.
    pub headwords: Option<BTreeSet<String>>,
}

/// Counters for one run. Lives only for the duration of the run and its
/// summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRun {
    /// Entries in the work set.
    pub total: usize,
    /// Entries attempted so far.
    pub processed: usize,
    /// Entries that gained a lexical record.
    pub migrated: usize,
    /// Entries that gained a missing marker (absent or gave up).
    pub marked_missing: usize,
    /// Headwords needing manual follow-up, in processing order.
    pub failed_headwords: Vec<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub ended_at: Option<DateTime<Utc>>,
}

impl MigrationRun {
    fn new() -> Self {
        Self {
            total: 0,
            processed: 0,
            migrated: 0,
            marked_missing: 0,
            failed_headwords: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    fn record(&mut self, headword: &str, outcome: &EntryOutcome) {
        self.processed += 1;
        match outcome {
            EntryOutcome::Migrated { .. } => self.migrated += 1,
            EntryOutcome::Missing {
                kind: MissingKind::Absent,
                ..
            } => self.marked_missing += 1,
            EntryOutcome::Missing {
                kind: MissingKind::GaveUp,
                ..
            } => {
                self.marked_missing += 1;
                self.failed_headwords.push(headword.to_string());
            }
            EntryOutcome::StoreFailed { .. } => {
                self.failed_headwords.push(headword.to_string());
            }
        }
    }
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// A record was written.
    Migrated {
        /// Whether the record carries etymology.
        has_etymology: bool,
        /// Number of usage examples stored.
        examples: usize,
    },
    /// A missing marker was written.
    Missing {
        /// Absent or gave up.
        kind: MissingKind,
        /// Reason stored on the marker.
        reason: String,
    },
    /// The outcome could not be persisted. The entry stays in the work set.
    StoreFailed {
        /// The persistence error.
        reason: String,
    },
}

impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Migrated {
                has_etymology,
                examples,
            } => write!(
                f,
                "migrated ({}, {examples} example{})",
                if *has_etymology { "etymology" } else { "no etymology" },
                if *examples == 1 { "" } else { "s" }
            ),
            Self::Missing {
                kind: MissingKind::Absent,
                reason,
            } => write!(f, "missing ({reason})"),
            Self::Missing {
                kind: MissingKind::GaveUp,
                reason,
            } => write!(f, "gave up ({reason})"),
            Self::StoreFailed { reason } => write!(f, "not persisted ({reason})"),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct MigrationSummary {
    /// Final counters.
    pub run: MigrationRun,
    /// Coverage over all persisted records after the run.
    pub coverage: CoverageStats,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.run.failed_headwords.len();
        writeln!(f, "Migration complete in {:.1?}", self.duration)?;
        writeln!(
            f,
            "  Processed: {}/{} ({} migrated, {} marked missing, {failed} failed)",
            self.run.processed, self.run.total, self.run.migrated, self.run.marked_missing
        )?;
        writeln!(
            f,
            "  Coverage:  {} records, etymology {}, examples {}",
            self.coverage.total,
            format_percent(self.coverage.etymology_percent()),
            format_percent(self.coverage.examples_percent()),
        )?;
        if failed > 0 {
            writeln!(f, "  Failed headwords:")?;
            for headword in &self.run.failed_headwords {
                writeln!(f, "    {headword}")?;
            }
        }
        Ok(())
    }
}

/// `[n/total] (pct%) Processing: <headword>` for the `n`th of `total`
/// entries.
fn progress_line(n: usize, total: usize, headword: &str) -> String {
    #[allow(clippy::cast_precision_loss)]
    let percent = if total == 0 {
        0.0
    } else {
        n as f64 / total as f64 * 100.0
    };
    format!("[{n}/{total}] ({percent:.1}%) Processing: {headword}")
}

/// Formats a percentage, or `n/a` when there is nothing to divide by.
#[must_use]
pub fn format_percent(percent: Option<f64>) -> String {
    percent.map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"))
}

/// Drives one migration run over a [`LexiconStore`].
pub struct MigrationOrchestrator<S: LexiconStore> {
    fetcher: DefinitionFetcher,
    store: S,
    progress: Arc<dyn ProgressCallback>,
    phase: Phase,
}

impl<S: LexiconStore> MigrationOrchestrator<S> {
    /// Creates an idle orchestrator.
    #[must_use]
    pub fn new(fetcher: DefinitionFetcher, store: S) -> Self {
        Self {
            fetcher,
            store,
            progress: null_progress(),
            phase: Phase::Idle,
        }
    }

    /// Reports per-entry progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    fn transition(&mut self, next: Phase) {
        log::debug!("Migration phase: {} -> {next}", self.phase);
        self.phase = next;
    }

    /// Performs the run and consumes the orchestrator.
    ///
    /// Per-entry failures never abort the run; they end up in
    /// [`MigrationRun::failed_headwords`] or as missing markers.
    ///
    /// # Errors
    ///
    /// * [`MigrateError::InvalidLimit`] if `options.limit` is `Some(0)`
    /// * [`MigrateError::Store`] if the work set or coverage cannot be
    ///   queried
    #[allow(clippy::future_not_send)]
    pub async fn run(mut self, options: &RunOptions) -> Result<MigrationSummary, MigrateError> {
        if options.limit == Some(0) {
            return Err(MigrateError::InvalidLimit);
        }

        let start = Instant::now();
        let mut run = MigrationRun::new();

        self.transition(Phase::ComputingWorkSet);
        let work_set = self.compute_work_set(options)?;
        run.total = work_set.len();
        log::info!("{} entries to migrate", run.total);

        self.transition(Phase::Processing);
        self.progress.set_total(run.total as u64);
        for (index, entry) in work_set.iter().enumerate() {
            self.progress.set_message(entry.headword.clone());
            log::info!("{}", progress_line(index + 1, run.total, &entry.headword));

            let outcome = self.process_entry(entry).await;
            let line = format!("{}: {outcome}", entry.headword);
            match outcome {
                EntryOutcome::Migrated { .. }
                | EntryOutcome::Missing {
                    kind: MissingKind::Absent,
                    ..
                } => log::info!("{line}"),
                EntryOutcome::Missing { .. } | EntryOutcome::StoreFailed { .. } => {
                    log::error!("{line}");
                }
            }

            run.record(&entry.headword, &outcome);
            self.progress.inc(1);
        }

        self.transition(Phase::Reporting);
        let coverage = self.store.compute_coverage_stats()?;
        run.ended_at = Some(Utc::now());

        let summary = MigrationSummary {
            run,
            coverage,
            duration: start.elapsed(),
        };
        self.progress.finish(format!(
            "{} migrated, {} failed",
            summary.run.migrated,
            summary.run.failed_headwords.len()
        ));

        self.transition(Phase::Done);
        Ok(summary)
    }

    fn compute_work_set(&self, options: &RunOptions) -> Result<Vec<VocabularyEntry>, DbError> {
        let mut entries = self.store.list_unmigrated_entries()?;

        if let Some(headwords) = &options.headwords {
            entries.retain(|entry| headwords.contains(&entry.headword));
        }
        if let Some(limit) = options.limit {
            entries.truncate(limit);
        }

        Ok(entries)
    }

    #[allow(clippy::future_not_send)]
    async fn process_entry(&mut self, entry: &VocabularyEntry) -> EntryOutcome {
        match self.fetcher.fetch(&entry.headword).await {
            Ok(normalized) => {
                let record = normalized.into_record(entry.id.clone());
                let has_etymology = record.etymology.is_some();
                let examples = record.examples.len();

                match self.store.upsert_lexical_record(&record) {
                    Ok(()) => EntryOutcome::Migrated {
                        has_etymology,
                        examples,
                    },
                    Err(e) => EntryOutcome::StoreFailed {
                        reason: e.to_string(),
                    },
                }
            }
            Err(e) => self.mark_missing(entry, &e),
        }
    }

    fn mark_missing(&mut self, entry: &VocabularyEntry, error: &DefinitionError) -> EntryOutcome {
        let kind = if error.is_absence() {
            MissingKind::Absent
        } else {
            MissingKind::GaveUp
        };
        let reason = error.to_string();

        match self.store.mark_missing(&entry.id, kind, &reason) {
            Ok(()) => EntryOutcome::Missing { kind, reason },
            Err(e) => EntryOutcome::StoreFailed {
                reason: format!("{reason}; marker not written: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lexicon_database::DuckDbStore;
    use lexicon_models::LexicalRecord;
    use lexicon_source::{HttpResponse, HttpTransport};

    use super::*;

    const SUMMARY: &str = "https://en.wiktionary.org/api/rest_v1/page/definition/";
    const MARKUP: &str = "https://en.wiktionary.org/w/api.php";

    const EPHEMERAL_SUMMARY: &str = r#"{"en":[{"partOfSpeech":"adjective","definitions":[{"definition":"Lasting for a short period of time.","examples":["an ephemeral pleasure"]}]}]}"#;

    const EPHEMERAL_MARKUP: &str = r#"{"query":{"pages":{"35812":{"title":"ephemeral","revisions":[{"slots":{"main":{"*":"==English==\n===Etymology===\nFrom {{bor|en|grc|ἐφήμερος||lasting a day}}, from {{af|grc|ἐπί|ἡμέρα}}.\n===Adjective===\n# short-lived\n"}}}]}}}}"#;

    const MISSING_MARKUP: &str =
        r#"{"query":{"pages":{"-1":{"ns":0,"title":"xyzzyq","missing":""}}}}"#;

    /// Serves canned responses keyed by URL prefix; everything else is 404.
    struct RoutedTransport {
        routes: Vec<(String, HttpResponse)>,
        requests: Mutex<Vec<String>>,
    }

    impl RoutedTransport {
        fn new(routes: &[(&str, u16, &str)]) -> Arc<Self> {
            Arc::new(Self {
                routes: routes
                    .iter()
                    .map(|(prefix, status, body)| ((*prefix).to_string(), HttpResponse::new(*status, *body)))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for RoutedTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(self
                .routes
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map_or_else(|| HttpResponse::new(404, ""), |(_, response)| response.clone()))
        }
    }

    /// Fails every upsert for one entry.
    struct FailingStore {
        inner: DuckDbStore,
        poisoned_entry: String,
    }

    impl LexiconStore for FailingStore {
        fn upsert_lexical_record(&mut self, record: &LexicalRecord) -> Result<(), DbError> {
            if record.entry_id == self.poisoned_entry {
                return Err(DbError::Conversion {
                    message: "disk full".to_string(),
                });
            }
            self.inner.upsert_lexical_record(record)
        }

        fn mark_missing(&mut self, entry_id: &str, kind: MissingKind, reason: &str) -> Result<(), DbError> {
            self.inner.mark_missing(entry_id, kind, reason)
        }

        fn list_unmigrated_entries(&self) -> Result<Vec<VocabularyEntry>, DbError> {
            self.inner.list_unmigrated_entries()
        }

        fn compute_coverage_stats(&self) -> Result<CoverageStats, DbError> {
            self.inner.compute_coverage_stats()
        }
    }

    fn fetcher(transport: Arc<RoutedTransport>) -> DefinitionFetcher {
        DefinitionFetcher::from_config(SourceConfig::embedded().unwrap(), transport)
    }

    fn store_with(entries: &[(&str, &str)]) -> DuckDbStore {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        let entries: Vec<_> = entries
            .iter()
            .map(|(id, headword)| VocabularyEntry::new(*id, *headword, 1))
            .collect();
        store.insert_vocabulary(&entries).unwrap();
        store
    }

    fn summary_route(headword: &str) -> String {
        format!("{SUMMARY}{headword}")
    }

    fn markup_route(headword: &str) -> String {
        format!("{MARKUP}?action=query&prop=revisions&rvprop=content&rvslots=main&format=json&titles={headword}")
    }

    /// Asserts every entry has exactly one terminal outcome.
    fn assert_disjoint_outcomes(store: &DuckDbStore, ids: &[&str]) {
        for id in ids {
            let has_record = store.record_for(id).unwrap().is_some();
            let has_marker = store.marker_for(id).unwrap().is_some();
            assert!(has_record ^ has_marker, "entry {id}: record={has_record} marker={has_marker}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn migrates_entry_with_etymology_and_example() {
        let transport = RoutedTransport::new(&[
            (SUMMARY, 200, EPHEMERAL_SUMMARY),
            (MARKUP, 200, EPHEMERAL_MARKUP),
        ]);
        let mut store = store_with(&[("e1", "ephemeral")]);

        let summary = MigrationOrchestrator::new(fetcher(transport), &mut store)
            .run(&RunOptions::default())
            .await
            .unwrap();

        let record = store.record_for("e1").unwrap().unwrap();
        assert_eq!(record.part_of_speech, "adjective");
        assert_eq!(record.examples, vec!["an ephemeral pleasure".to_string()]);
        assert!(record.etymology.as_deref().unwrap().starts_with("From Ancient Greek ἐφήμερος"));
        assert_eq!(record.source_url, "https://en.wiktionary.org/wiki/ephemeral");

        assert_eq!(summary.run.total, 1);
        assert_eq!(summary.run.processed, 1);
        assert_eq!(summary.run.migrated, 1);
        assert!(summary.run.failed_headwords.is_empty());
        assert!(summary.run.ended_at.is_some());
        assert_eq!(
            summary.coverage,
            CoverageStats {
                total: 1,
                with_etymology: 1,
                with_examples: 1,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn absent_headword_is_marked_and_excluded_from_coverage() {
        let transport = RoutedTransport::new(&[
            (SUMMARY, 200, "{}"),
            (MARKUP, 200, MISSING_MARKUP),
        ]);
        let mut store = store_with(&[("e9", "xyzzyq")]);

        let summary = MigrationOrchestrator::new(fetcher(transport), &mut store)
            .run(&RunOptions::default())
            .await
            .unwrap();

        let marker = store.marker_for("e9").unwrap().unwrap();
        assert_eq!(marker.kind, MissingKind::Absent);
        assert!(marker.reason.contains("xyzzyq"));
        assert!(store.record_for("e9").unwrap().is_none());

        assert_eq!(summary.run.marked_missing, 1);
        assert!(summary.run.failed_headwords.is_empty());
        assert_eq!(summary.coverage.total, 0);
        assert!(summary.coverage.etymology_percent().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn summary_404_is_absent() {
        let transport = RoutedTransport::new(&[]);
        let mut store = store_with(&[("e9", "xyzzyq")]);

        MigrationOrchestrator::new(fetcher(transport.clone()), &mut store)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(store.marker_for("e9").unwrap().unwrap().kind, MissingKind::Absent);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_give_up_and_continue() {
        let transport = RoutedTransport::new(&[
            (summary_route("ephemeral").as_str(), 200, EPHEMERAL_SUMMARY),
            (markup_route("ephemeral").as_str(), 200, EPHEMERAL_MARKUP),
            (summary_route("hubris").as_str(), 503, ""),
        ]);
        let mut store = store_with(&[("e1", "ephemeral"), ("e2", "hubris")]);

        let summary = MigrationOrchestrator::new(fetcher(transport), &mut store)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.run.processed, 2);
        assert_eq!(summary.run.migrated, 1);
        assert_eq!(summary.run.marked_missing, 1);
        assert_eq!(summary.run.failed_headwords, vec!["hubris".to_string()]);

        let marker = store.marker_for("e2").unwrap().unwrap();
        assert_eq!(marker.kind, MissingKind::GaveUp);
        assert!(marker.reason.contains("Gave up after 6 attempts"));
        assert_disjoint_outcomes(&store, &["e1", "e2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn rerun_has_empty_work_set() {
        let transport = RoutedTransport::new(&[
            (summary_route("ephemeral").as_str(), 200, EPHEMERAL_SUMMARY),
            (markup_route("ephemeral").as_str(), 200, EPHEMERAL_MARKUP),
        ]);
        let mut store = store_with(&[("e1", "ephemeral"), ("e9", "xyzzyq")]);

        MigrationOrchestrator::new(fetcher(transport.clone()), &mut store)
            .run(&RunOptions::default())
            .await
            .unwrap();
        let requests_after_first = transport.request_count();

        let summary = MigrationOrchestrator::new(fetcher(transport.clone()), &mut store)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.run.total, 0);
        assert_eq!(summary.run.processed, 0);
        assert_eq!(transport.request_count(), requests_after_first);
        assert_eq!(summary.coverage.total, 1);
        assert_disjoint_outcomes(&store, &["e1", "e9"]);
    }

    #[tokio::test(start_paused = true)]
    async fn limit_caps_work_set_in_headword_order() {
        let transport = RoutedTransport::new(&[]);
        let mut store = store_with(&[("e3", "zeal"), ("e1", "apple"), ("e2", "mango")]);

        let options = RunOptions {
            limit: Some(2),
            ..RunOptions::default()
        };
        let summary = MigrationOrchestrator::new(fetcher(transport), &mut store)
            .run(&options)
            .await
            .unwrap();

        assert_eq!(summary.run.total, 2);
        assert!(store.marker_for("e1").unwrap().is_some());
        assert!(store.marker_for("e2").unwrap().is_some());
        assert!(store.marker_for("e3").unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_limit_is_rejected() {
        let transport = RoutedTransport::new(&[]);
        let mut store = store_with(&[("e1", "apple")]);

        let options = RunOptions {
            limit: Some(0),
            ..RunOptions::default()
        };
        let result = MigrationOrchestrator::new(fetcher(transport.clone()), &mut store)
            .run(&options)
            .await;

        assert!(matches!(result, Err(MigrateError::InvalidLimit)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn headword_filter_restricts_work_set() {
        let transport = RoutedTransport::new(&[]);
        let mut store = store_with(&[("e1", "apple"), ("e2", "mango"), ("e3", "zeal")]);

        let options = RunOptions {
            headwords: Some(["zeal".to_string()].into_iter().collect()),
            ..RunOptions::default()
        };
        let summary = MigrationOrchestrator::new(fetcher(transport), &mut store)
            .run(&options)
            .await
            .unwrap();

        assert_eq!(summary.run.total, 1);
        assert!(store.marker_for("e3").unwrap().is_some());
        assert!(store.marker_for("e1").unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn persistence_failure_does_not_stop_the_run() {
        let transport = RoutedTransport::new(&[
            (SUMMARY, 200, EPHEMERAL_SUMMARY),
            (MARKUP, 200, EPHEMERAL_MARKUP),
        ]);
        let mut store = FailingStore {
            inner: store_with(&[("e1", "apple"), ("e2", "mango")]),
            poisoned_entry: "e1".to_string(),
        };

        let summary = MigrationOrchestrator::new(fetcher(transport), &mut store)
            .run(&RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.run.processed, 2);
        assert_eq!(summary.run.migrated, 1);
        assert_eq!(summary.run.failed_headwords, vec!["apple".to_string()]);

        // The unpersisted entry is picked up again by the next run.
        let pending = store.list_unmigrated_entries().unwrap();
        assert_eq!(pending, vec![VocabularyEntry::new("e1", "apple", 1)]);
    }

    #[test]
    fn new_orchestrator_is_idle() {
        let store = DuckDbStore::open_in_memory().unwrap();
        let orchestrator = MigrationOrchestrator::new(fetcher(RoutedTransport::new(&[])), store);
        assert_eq!(orchestrator.phase(), Phase::Idle);
    }

    #[test]
    fn summary_lists_failed_headwords() {
        let mut run = MigrationRun::new();
        run.total = 2;
        run.record("apple", &EntryOutcome::Migrated { has_etymology: true, examples: 1 });
        run.record(
            "mango",
            &EntryOutcome::Missing {
                kind: MissingKind::GaveUp,
                reason: "timeout".to_string(),
            },
        );
        let summary = MigrationSummary {
            run,
            coverage: CoverageStats {
                total: 1,
                with_etymology: 1,
                with_examples: 0,
            },
            duration: Duration::from_secs(3),
        };

        let text = summary.to_string();
        assert!(text.contains("Processed: 2/2 (1 migrated, 1 marked missing, 1 failed)"));
        assert!(text.contains("etymology 100.0%, examples 0.0%"));
        assert!(text.contains("    mango"));
    }

    #[test]
    fn outcome_lines_are_readable() {
        let outcome = EntryOutcome::Migrated {
            has_etymology: false,
            examples: 1,
        };
        assert_eq!(outcome.to_string(), "migrated (no etymology, 1 example)");
        assert_eq!(format_percent(None), "n/a");
    }

    #[test]
    fn progress_line_shows_position_and_percent() {
        assert_eq!(
            progress_line(1, 4, "ephemeral"),
            "[1/4] (25.0%) Processing: ephemeral"
        );
        assert_eq!(progress_line(3, 3, "xyzzyq"), "[3/3] (100.0%) Processing: xyzzyq");
    }
}
