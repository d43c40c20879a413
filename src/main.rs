//! Application entry point for transcript QA.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Open the [`DictionaryStore`] (empty dictionary when the file is missing).
//! 4. Dispatch on the first argument:
//!
//! | Invocation | Effect |
//! |------------|--------|
//! | `transcript-qa <doc.json>...` | run each `DocumentInput`, one JSON result per line |
//! | `transcript-qa propose <pairs.json>` | learn from raw/reference pairs, print proposals |
//! | `transcript-qa merge <proposals.json>` | merge the `accepted` proposals into the dictionary |

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use transcript_qa::{
    config::{AppConfig, AppPaths},
    dictionary::DictionaryStore,
    learn::{merge_accepted, LearningProposal, LearningProposer, ReferencePair},
    pipeline::{BatchRunner, BatchSummary, DocumentFailure, DocumentInput, DocumentResult, Stage},
};

const USAGE: &str = "usage: transcript-qa <document.json>... | propose <pairs.json> | merge <proposals.json>";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run_documents(config: &AppConfig, store: &DictionaryStore, paths: &[PathBuf]) -> Result<()> {
    let mut inputs = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        match DocumentInput::from_path(path) {
            Ok(input) => inputs.push(input),
            Err(e) => {
                log::warn!("Skipping {}: {e:#}", path.display());
                unreadable.push(DocumentResult::Failed(DocumentFailure {
                    case_id: path.display().to_string(),
                    stage: Stage::Input,
                    error: format!("{e:#}"),
                }));
            }
        }
    }

    let runner = BatchRunner::new(config)?;
    let mut results = runner.run(store, inputs).await;
    results.extend(unreadable);

    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }

    let summary = BatchSummary::from_results(&results);
    log::info!(
        "{} documents: {} pass, {} conditional, {} fail, {} errors",
        summary.documents,
        summary.passed,
        summary.conditional,
        summary.failed_qa,
        summary.errors
    );
    Ok(())
}

fn propose(config: &AppConfig, store: &DictionaryStore, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let pairs: Vec<ReferencePair> =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

    let proposer = LearningProposer::new(config.learning.clone());
    let run = proposer.propose_all(&pairs, &store.snapshot());
    log::info!(
        "{} proposals from {} documents ({} candidates filtered, {} documents failed)",
        run.proposals.len(),
        run.documents,
        run.tally.total(),
        run.failures.len()
    );
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}

fn merge(store: &DictionaryStore, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let proposals: Vec<LearningProposal> =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

    let report = merge_accepted(store, &proposals, Local::now().date_naive())?;
    if let Some(commit) = &report.commit {
        log::info!(
            "Dictionary v{} → v{} ({} entries), backup at {}",
            commit.previous_version,
            commit.version,
            commit.entry_count,
            commit.backup_path.display()
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Dictionary
    let paths = AppPaths::new();
    let store = DictionaryStore::open(config.dictionary_path(&paths), config.backup_dir(&paths))?;

    // 4. Dispatch
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => bail!(USAGE),
        Some("propose") => match args.get(1) {
            Some(file) => propose(&config, &store, Path::new(file)),
            None => bail!(USAGE),
        },
        Some("merge") => match args.get(1) {
            Some(file) => merge(&store, Path::new(file)),
            None => bail!(USAGE),
        },
        Some(_) => {
            let files: Vec<PathBuf> = args.iter().map(PathBuf::from).collect();
            run_documents(&config, &store, &files).await
        }
    }
}
