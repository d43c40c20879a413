//! Correction engine: four ordered dictionary passes plus cross-validation.
//!
//! # Overview
//!
//! | Pass | Category | Typical fix |
//! |------|----------|-------------|
//! | 1 | `LegalTerms` | `article 87` → `article 96` |
//! | 2 | `ProperNounsDiacritics` | `Michoacan` → `Michoacán` |
//! | 3 | `GrammaticalAgreement` | `citoyen` → `citoyenne` |
//! | 4 | `MisrecognizedVocabulary` | `affairement` → `avortement` |
//!
//! Each pass reads the previous pass's output. Every replacement produces a
//! [`CorrectionRecord`], which feeds both the audit trail and the quality
//! score. Running the engine over its own output yields no records.

pub mod crossval;
pub mod engine;

pub use crossval::{cross_validate, EntityRole, ExpectedEntity, Severity};
pub use engine::CorrectionEngine;

use serde::{Deserialize, Serialize};

use crate::dictionary::CorrectionCategory;
use crate::qa::QaWarning;

// ---------------------------------------------------------------------------
// CorrectionRecord / CorrectionOutcome
// ---------------------------------------------------------------------------

/// One applied replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub pass: CorrectionCategory,
    /// Character offset of `after` in the text produced by this pass.
    pub position: usize,
    pub before: String,
    pub after: String,
}

/// Everything a correction run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub text: String,
    /// Records in pass order, then position order.
    pub records: Vec<CorrectionRecord>,
    pub warnings: Vec<QaWarning>,
    /// Version of the dictionary snapshot the run used.
    pub dictionary_version: u32,
}

impl CorrectionOutcome {
    /// Number of records per category, in canonical order.
    pub fn counts_by_category(&self) -> Vec<(CorrectionCategory, usize)> {
        CorrectionCategory::CANONICAL_ORDER
            .iter()
            .map(|c| (*c, self.records.iter().filter(|r| r.pass == *c).count()))
            .collect()
    }
}
