//! Structural document criteria.
//!
//! | Criterion | Kind | Passes when |
//! |-----------|------|-------------|
//! | `header_block` | fatal | every common and variant header marker is present |
//! | `zero_tolerance_terms` | fatal | none of the catastrophic terms appears |
//! | `certification` | fatal | the certification marker is present |
//! | `document_title` | advisory | the variant's title is present |
//! | `closing_marker` | advisory | the variant's closing marker is present |
//!
//! Matching is done on normalized text (lowercase, straight apostrophes,
//! single spaces), so line breaks inside a header do not matter. Advisory
//! criteria are only reported when the variant defines them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::QaConfig;
use crate::extract::SectionVariant;
use crate::text::normalize_for_matching;

pub const HEADER_BLOCK: &str = "header_block";
pub const ZERO_TOLERANCE_TERMS: &str = "zero_tolerance_terms";
pub const CERTIFICATION: &str = "certification";
pub const DOCUMENT_TITLE: &str = "document_title";
pub const CLOSING_MARKER: &str = "closing_marker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionResult {
    Pass,
    Fail,
}

/// Result of one criterion, with what was missing or found on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub result: CriterionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CriterionOutcome {
    pub fn pass() -> Self {
        Self {
            result: CriterionResult::Pass,
            detail: None,
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            result: CriterionResult::Fail,
            detail: Some(detail.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.result == CriterionResult::Pass
    }
}

pub type CriteriaMap = BTreeMap<String, CriterionOutcome>;

/// Evaluate the fatal criteria over the assembled document.
pub fn fatal_criteria(config: &QaConfig, variant: &SectionVariant, document: &str) -> CriteriaMap {
    let haystack = normalize_for_matching(document);
    let mut map = CriteriaMap::new();

    let missing: Vec<&str> = config
        .header_markers
        .iter()
        .chain(variant.header_markers.iter())
        .filter(|m| !contains(&haystack, m))
        .map(String::as_str)
        .collect();
    map.insert(
        HEADER_BLOCK.into(),
        if missing.is_empty() {
            CriterionOutcome::pass()
        } else {
            CriterionOutcome::fail(format!("missing header marker(s): {}", missing.join(", ")))
        },
    );

    let found: Vec<&str> = config
        .zero_tolerance_terms
        .iter()
        .filter(|t| contains(&haystack, t))
        .map(String::as_str)
        .collect();
    map.insert(
        ZERO_TOLERANCE_TERMS.into(),
        if found.is_empty() {
            CriterionOutcome::pass()
        } else {
            CriterionOutcome::fail(format!("found: {}", found.join(", ")))
        },
    );

    map.insert(
        CERTIFICATION.into(),
        if contains(&haystack, &config.certification_marker) {
            CriterionOutcome::pass()
        } else {
            CriterionOutcome::fail(format!("missing {:?}", config.certification_marker))
        },
    );

    map
}

/// Evaluate the advisory criteria the variant defines.
pub fn advisory_criteria(variant: &SectionVariant, document: &str) -> CriteriaMap {
    let haystack = normalize_for_matching(document);
    let mut map = CriteriaMap::new();

    let checks = [
        (DOCUMENT_TITLE, variant.document_title.as_deref()),
        (CLOSING_MARKER, variant.closing_marker.as_deref()),
    ];
    for (id, marker) in checks {
        let Some(marker) = marker else { continue };
        let outcome = if contains(&haystack, marker) {
            CriterionOutcome::pass()
        } else {
            CriterionOutcome::fail(format!("missing {marker:?}"))
        };
        map.insert(id.into(), outcome);
    }
    map
}

fn contains(normalized_haystack: &str, needle: &str) -> bool {
    let needle = normalize_for_matching(needle);
    // An empty marker can never be "missing".
    needle.is_empty() || normalized_haystack.contains(&needle)
}
