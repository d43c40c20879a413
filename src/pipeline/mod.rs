//! Pipeline orchestrator for hearing transcripts.
//!
//! This module wires extraction → cleaning → correction → scoring for one
//! document and runs batches of documents on tokio's blocking pool.
//!
//! # Architecture
//!
//! ```text
//! Vec<DocumentInput>
//!        │
//!        ▼
//! BatchRunner::run()  ← async, takes one Arc<Dictionary> snapshot
//!        │
//!        ├─ spawn_blocking(DocumentPipeline::run)  ── document 1
//!        ├─ spawn_blocking(DocumentPipeline::run)  ── document 2
//!        └─ …                                          (max_parallel at a time)
//!        │
//!        ▼
//! Vec<DocumentResult>  (input order; failures isolated per document)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use transcript_qa::config::{AppConfig, AppPaths};
//! use transcript_qa::dictionary::DictionaryStore;
//! use transcript_qa::pipeline::{BatchRunner, DocumentInput};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let paths = AppPaths::new();
//!     let store = DictionaryStore::open(config.dictionary_path(&paths), config.backup_dir(&paths))?;
//!
//!     let input = DocumentInput::from_path("MC3-16722.json".as_ref())?;
//!     let results = BatchRunner::new(&config)?.run(&store, vec![input]).await;
//!     println!("{}", serde_json::to_string_pretty(&results)?);
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use input::DocumentInput;
pub use runner::{BatchRunner, DocumentError, DocumentPipeline, PipelineError};
pub use state::{BatchSummary, DocumentFailure, DocumentResult, ProcessedDocument, Stage};
