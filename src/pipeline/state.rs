//! Per-document stages and results.
//!
//! [`Stage`] names the step a document was in when it failed. The batch
//! runner reports one [`DocumentResult`] per input, in input order, and a
//! [`BatchSummary`] over all of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clean::CleanReport;
use crate::extract::ExtractionResult;
use crate::qa::{QaReport, Verdict};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Steps at which a document can be aborted.
///
/// Cleaning, correction and scoring always complete once a document has a
/// body, so they have no stage of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the input, resolving its variant, or an empty body.
    Input,
    /// No section boundary in the stream.
    Extraction,
    /// The worker itself failed (panic or cancelled task).
    Runtime,
}

impl Stage {
    /// A short human-readable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Extraction => "extraction",
            Stage::Runtime => "runtime",
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Everything a successful run produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub case_id: String,
    pub variant: String,
    /// `None` for variants that keep the full stream.
    pub extraction: Option<ExtractionResult>,
    pub cleaning: CleanReport,
    /// Diarization label → tribunal role. Empty for untagged streams.
    #[serde(default)]
    pub speakers: BTreeMap<String, String>,
    /// Corrected body, `ROLE : ` in front of each change of speaker.
    pub corrected_text: String,
    pub report: QaReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub case_id: String,
    pub stage: Stage,
    pub error: String,
}

/// Outcome of one document in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentResult {
    Processed(Box<ProcessedDocument>),
    Failed(DocumentFailure),
}

impl DocumentResult {
    pub fn case_id(&self) -> &str {
        match self {
            DocumentResult::Processed(doc) => &doc.case_id,
            DocumentResult::Failed(failure) => &failure.case_id,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, DocumentResult::Processed(_))
    }

    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            DocumentResult::Processed(doc) => Some(doc.report.verdict),
            DocumentResult::Failed(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BatchSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub documents: usize,
    pub passed: usize,
    pub conditional: usize,
    /// Processed documents whose verdict is `Fail`.
    pub failed_qa: usize,
    /// Documents that did not reach a verdict.
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[DocumentResult]) -> Self {
        let mut summary = Self {
            documents: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.verdict() {
                Some(Verdict::Pass) => summary.passed += 1,
                Some(Verdict::PassConditional) => summary.conditional += 1,
                Some(Verdict::Fail) => summary.failed_qa += 1,
                None => summary.errors += 1,
            }
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
