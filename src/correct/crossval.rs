//! Cross-validation of the corrected text against case metadata.
//!
//! The case file tells us what must appear in the transcript (file number,
//! presiding member, participants, hearing date). A missing entity does not
//! block the document; it becomes a [`QaWarning::CrossValidationMismatch`]
//! carrying the role's severity.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::qa::QaWarning;

/// What an expected entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    FileNumber,
    PresidingMember,
    Participant,
    HearingDate,
}

impl EntityRole {
    /// Severity used when the entity does not specify one.
    pub fn default_severity(&self) -> Severity {
        match self {
            EntityRole::FileNumber | EntityRole::PresidingMember => Severity::High,
            EntityRole::Participant => Severity::Medium,
            EntityRole::HearingDate => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A value the corrected text is expected to contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedEntity {
    pub role: EntityRole,
    pub value: String,
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl ExpectedEntity {
    pub fn new(role: EntityRole, value: impl Into<String>) -> Self {
        Self {
            role,
            value: value.into(),
            severity: None,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity.unwrap_or_else(|| self.role.default_severity())
    }
}

/// Check that every non-empty expected value occurs in `text`
/// (case-insensitive).
pub fn cross_validate(text: &str, expected: &[ExpectedEntity]) -> Vec<QaWarning> {
    let haystack = text.to_lowercase();
    let mut warnings = Vec::new();

    for entity in expected {
        let needle = entity.value.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if haystack.contains(&needle) {
            info!("Cross-validation: {:?} {:?} present", entity.role, entity.value);
        } else {
            warn!(
                "Cross-validation: {:?} {:?} missing from text ({:?})",
                entity.role,
                entity.value,
                entity.severity()
            );
            warnings.push(QaWarning::CrossValidationMismatch {
                role: entity.role,
                expected: entity.value.clone(),
                severity: entity.severity(),
            });
        }
    }
    warnings
}
