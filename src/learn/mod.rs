//! Continuous learning: proposes dictionary entries from verified
//! references.
//!
//! # Flow
//!
//! ```text
//! raw transcript ─┐
//!                 ├─ align (Myers) ─ replace hunks ─ filters ─ classify ─ proposals (Pending)
//! reference ──────┘                                                           │
//!                                                                  human review (accept / reject)
//!                                                                             │
//!                                          merge_accepted ─ DictionaryWriter ─ backup + commit
//! ```
//!
//! Nothing in this module mutates the dictionary without an explicit
//! `Accepted` status on the proposal.

pub mod align;
pub mod classify;
pub mod merge;
pub mod proposer;
pub mod similarity;

pub use classify::{CategoryClassifier, DEFAULT_ANCHOR_TOKENS, DEFAULT_BLACKLIST, DEFAULT_LEGAL_MARKERS};
pub use merge::{merge_accepted, MergeConflict, MergeReport};
pub use proposer::{
    Candidate, FilterTally, LearningProposal, LearningProposer, LearningRun, ProposalBatch,
    ProposalStatus, ReferencePair, Rejection,
};

use thiserror::Error;

// ---------------------------------------------------------------------------
// LearnError
// ---------------------------------------------------------------------------

/// Per-document learning failures. A batch keeps going after any of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LearnError {
    #[error("reference for {case_id} is empty")]
    EmptyReference { case_id: String },

    #[error("machine transcript for {case_id} is empty")]
    EmptyTranscript { case_id: String },

    /// The reference does not look like the same hearing.
    #[error("reference for {case_id} shares only {:.0}% of its tokens with the transcript", .overlap * 100.0)]
    UnrelatedReference { case_id: String, overlap: f64 },
}
