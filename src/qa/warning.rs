//! Non-fatal findings attached to a document's report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::correct::{EntityRole, Severity};

/// A problem worth a reviewer's attention that does not stop the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QaWarning {
    /// The extracted section is outside the variant's expected length.
    OutOfRangeExtraction {
        word_count: usize,
        min_words: Option<usize>,
        max_words: Option<usize>,
    },
    /// An expected case entity is missing from the corrected text.
    CrossValidationMismatch {
        role: EntityRole,
        expected: String,
        severity: Severity,
    },
}

impl QaWarning {
    /// Severity used to rank warnings in a report.
    pub fn severity(&self) -> Severity {
        match self {
            QaWarning::OutOfRangeExtraction { .. } => Severity::Medium,
            QaWarning::CrossValidationMismatch { severity, .. } => *severity,
        }
    }
}

impl fmt::Display for QaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QaWarning::OutOfRangeExtraction {
                word_count,
                min_words,
                max_words,
            } => {
                let bound = |b: &Option<usize>| b.map_or_else(|| "-".to_string(), |n| n.to_string());
                write!(
                    f,
                    "extracted section has {word_count} words (expected {}..{})",
                    bound(min_words),
                    bound(max_words)
                )
            }
            QaWarning::CrossValidationMismatch {
                role,
                expected,
                severity,
            } => write!(f, "{role:?} {expected:?} not found in text ({severity:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let w = QaWarning::OutOfRangeExtraction {
            word_count: 900,
            min_words: Some(1500),
            max_words: Some(3000),
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "out_of_range_extraction");
        assert_eq!(json["word_count"], 900);

        let back: QaWarning = serde_json::from_value(json).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn display_mentions_the_band() {
        let w = QaWarning::OutOfRangeExtraction {
            word_count: 42,
            min_words: Some(1500),
            max_words: None,
        };
        assert_eq!(w.to_string(), "extracted section has 42 words (expected 1500..-)");
    }

    #[test]
    fn mismatch_carries_its_severity() {
        let w = QaWarning::CrossValidationMismatch {
            role: EntityRole::Participant,
            expected: "Me Tremblay".into(),
            severity: Severity::Medium,
        };
        assert_eq!(w.severity(), Severity::Medium);
        assert!(w.to_string().contains("Me Tremblay"));
    }
}
