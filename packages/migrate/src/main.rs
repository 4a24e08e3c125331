#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the etymology migration tool.

use std::collections::BTreeSet;
use std::time::Instant;

use clap::{Parser, Subcommand};
use lexicon_cli_utils::IndicatifProgress;
use lexicon_database::{DuckDbStore, LexiconStore, paths};
use lexicon_migrate::{
    MigrationOrchestrator, RunOptions, definition_fetcher_from_env, format_percent,
};

#[derive(Parser)]
#[command(name = "lexicon_migrate", about = "Vocabulary etymology migration tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every vocabulary entry that has no record or missing marker
    Run {
        /// Maximum number of entries to process (for staged runs)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },
    /// Print coverage and outcome counts without fetching anything
    Stats,
    /// Fetch headwords and print the normalized entry without persisting
    Probe {
        /// Headwords to look up
        #[arg(required = true)]
        headwords: Vec<String>,
    },
    /// Clear missing markers and migrate the affected entries again
    Remigrate {
        /// Headwords whose markers should be cleared
        headwords: Vec<String>,
        /// Also clear every marker left by exhausted retries
        #[arg(long)]
        gave_up: bool,
        /// Maximum number of entries to process
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = lexicon_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { limit } => {
            let store = DuckDbStore::open_default()?;
            let options = RunOptions {
                limit: limit.map(usize::try_from).transpose()?,
                headwords: None,
            };
            run(store, &options, &multi).await?;
        }
        Commands::Stats => {
            let store = DuckDbStore::open_default()?;
            print_stats(&store)?;
        }
        Commands::Probe { headwords } => {
            let fetcher = definition_fetcher_from_env()?;
            for headword in &headwords {
                let start = Instant::now();
                match fetcher.fetch(headword).await {
                    Ok(entry) => {
                        println!("{}", serde_json::to_string_pretty(&entry)?);
                    }
                    Err(e) => {
                        let kind = e
                            .fetch_kind()
                            .map_or_else(|| e.as_ref().to_string(), |kind| kind.to_string());
                        println!("{headword}: {kind}: {e}");
                    }
                }
                log::info!("{headword} probed in {:.1?}", start.elapsed());
            }
        }
        Commands::Remigrate {
            headwords,
            gave_up,
            limit,
        } => {
            if headwords.is_empty() && !gave_up {
                return Err("Specify headwords to remigrate or pass --gave-up".into());
            }

            let mut store = DuckDbStore::open_default()?;
            let mut targets: BTreeSet<String> = headwords.iter().cloned().collect();

            let cleared = store.clear_missing_markers(&headwords)?;
            log::info!("Cleared {cleared} markers for named headwords");

            if gave_up {
                let requeued = store.clear_gave_up_markers()?;
                log::info!("Cleared {} gave-up markers", requeued.len());
                targets.extend(requeued);
            }

            let options = RunOptions {
                limit: limit.map(usize::try_from).transpose()?,
                headwords: Some(targets),
            };
            run(store, &options, &multi).await?;
        }
    }

    Ok(())
}

#[allow(clippy::future_not_send)]
async fn run(
    mut store: DuckDbStore,
    options: &RunOptions,
    multi: &lexicon_cli_utils::MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = definition_fetcher_from_env()?;
    let progress = IndicatifProgress::headwords_bar(multi, "Computing work set...");

    let summary = MigrationOrchestrator::new(fetcher, &mut store)
        .with_progress(progress)
        .run(options)
        .await?;

    print!("{summary}");
    Ok(())
}

fn print_stats(store: &DuckDbStore) -> Result<(), Box<dyn std::error::Error>> {
    let counts = store.counts()?;
    let coverage = store.compute_coverage_stats()?;

    println!("Store: {}", paths::db_path().display());
    println!("{:<22} {:>8}", "Vocabulary entries", counts.vocabulary);
    println!("{:<22} {:>8}", "Lexical records", counts.records);
    println!("{:<22} {:>8}", "Missing (absent)", counts.absent);
    println!("{:<22} {:>8}", "Missing (gave up)", counts.gave_up);
    println!("{:<22} {:>8}", "Unmigrated", counts.unmigrated());
    println!("{}", "-".repeat(31));
    println!(
        "{:<22} {:>8}",
        "Etymology coverage",
        format_percent(coverage.etymology_percent())
    );
    println!(
        "{:<22} {:>8}",
        "Examples coverage",
        format_percent(coverage.examples_percent())
    );

    Ok(())
}
