//! Versioned correction dictionary.
//!
//! # Overview
//!
//! The dictionary maps recognizer mistakes to their correct form, partitioned
//! by [`CorrectionCategory`]. It is the only state shared across document
//! runs:
//!
//! | Access | Type | Rule |
//! |--------|------|------|
//! | read | `Arc<Dictionary>` from [`DictionaryStore::snapshot`] | a run keeps the snapshot it started with |
//! | write | [`DictionaryWriter`] from [`DictionaryStore::begin_write`] | one writer at a time, a second one fails with [`DictionaryError::WriteConflict`] |
//!
//! Every commit backs up the previous file before replacing it atomically.
//!
//! # Usage
//!
//! ```no_run
//! use transcript_qa::dictionary::{CorrectionCategory, DictionaryEntry, DictionaryStore};
//!
//! let store = DictionaryStore::open("dictionary.json", "backups").unwrap();
//! let mut writer = store.begin_write().unwrap();
//! writer
//!     .draft_mut()
//!     .upsert(DictionaryEntry::new(CorrectionCategory::LegalTerms, "en virtu", "en vertu"))
//!     .unwrap();
//! let outcome = writer.commit().unwrap();
//! println!("dictionary now at v{}", outcome.version);
//! ```

pub mod category;
pub mod model;
pub mod store;

pub use category::CorrectionCategory;
pub use model::{Dictionary, DictionaryEntry, InsertOutcome, TermRecord};
pub use store::{CommitOutcome, DictionaryStore, DictionaryWriter};

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// DictionaryError
// ---------------------------------------------------------------------------

/// All errors that can surface while loading, editing or persisting the
/// dictionary.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// Reading or writing the dictionary file failed.
    #[error("cannot access dictionary file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dictionary file is not UTF-8.
    #[error("dictionary file {} is not valid UTF-8: {source}", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    /// The dictionary file is not valid JSON (or has the wrong shape).
    #[error("malformed dictionary: {0}")]
    Parse(#[from] serde_json::Error),

    /// Empty term or identity mapping.
    #[error("invalid dictionary entry: {0}")]
    InvalidEntry(String),

    /// The entry's output is another entry's input, or the reverse.
    #[error("entry {incorrect:?} → {correct:?} would chain with {other}")]
    ChainedEntry {
        incorrect: String,
        correct: String,
        other: String,
    },

    /// Another writer holds the lock, or the file changed underneath us.
    #[error("dictionary write conflict: {0}")]
    WriteConflict(String),

    /// The pre-write backup could not be created; nothing was written.
    #[error("cannot write dictionary backup {}: {source}", path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
