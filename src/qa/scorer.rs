//! Composite score, verdict and the assembled [`QaReport`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::QaConfig;
use crate::correct::{CorrectionOutcome, CorrectionRecord, Severity};
use crate::extract::SectionVariant;

use super::criteria::{advisory_criteria, fatal_criteria, CriteriaMap};
use super::QaWarning;

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// `clamp(100 − 2·critical − moderate, 0, 100)`.
///
/// This measures how many errors the *input* carried (every correction is a
/// fixed error), not how good the corrected output is. A transcript the
/// engine repaired heavily scores low even when the result is clean.
///
/// ```
/// use transcript_qa::correct::CorrectionRecord;
/// use transcript_qa::dictionary::CorrectionCategory;
/// use transcript_qa::qa::initial_quality_score;
///
/// let rec = |pass| CorrectionRecord { pass, position: 0, before: "a".into(), after: "b".into() };
/// let records = vec![
///     rec(CorrectionCategory::LegalTerms),            // -2
///     rec(CorrectionCategory::ProperNounsDiacritics), // -1
/// ];
/// assert_eq!(initial_quality_score(&records), 97);
/// ```
pub fn initial_quality_score(records: &[CorrectionRecord]) -> u32 {
    let penalty: u32 = records.iter().map(|r| r.pass.weight()).sum();
    100u32.saturating_sub(penalty)
}

// ---------------------------------------------------------------------------
// Verdict / QualityLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    PassConditional,
    Fail,
}

/// Review effort label derived from the score alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Insufficient,
}

impl QualityLevel {
    pub fn from_score(score: u32, config: &QaConfig) -> Self {
        if score >= config.pass_threshold {
            Self::Excellent
        } else if score >= config.conditional_threshold {
            Self::Good
        } else if score >= config.fair_threshold {
            Self::Fair
        } else {
            Self::Insufficient
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Excellent => "Spot-check only (5-10 min)",
            Self::Good => "Quick review (15-20 min)",
            Self::Fair => "Thorough review (30-40 min)",
            Self::Insufficient => "Full manual review required",
        }
    }
}

// ---------------------------------------------------------------------------
// QaStatistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaStatistics {
    pub total_corrections: usize,
    /// Keyed by category identifier (`legal_terms`, ...).
    pub by_category: BTreeMap<String, usize>,
    pub critical: usize,
    pub moderate: usize,
    pub original_chars: usize,
    pub corrected_chars: usize,
    /// Length change in percent of the original, two decimals.
    pub modification_rate: f64,
}

impl QaStatistics {
    pub fn compute(original_text: &str, outcome: &CorrectionOutcome) -> Self {
        let by_category: BTreeMap<String, usize> = outcome
            .counts_by_category()
            .into_iter()
            .map(|(c, n)| (c.key().to_string(), n))
            .collect();
        let critical = outcome.records.iter().filter(|r| r.pass.is_critical()).count();
        let original_chars = original_text.chars().count();
        let corrected_chars = outcome.text.chars().count();

        let delta = corrected_chars as f64 - original_chars as f64;
        let rate = delta / original_chars.max(1) as f64 * 100.0;

        Self {
            total_corrections: outcome.records.len(),
            by_category,
            critical,
            moderate: outcome.records.len() - critical,
            original_chars,
            corrected_chars,
            modification_rate: (rate * 100.0).round() / 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// QaReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    pub case_id: String,
    pub variant: String,
    pub initial_quality_score: u32,
    pub level: QualityLevel,
    /// Fatal criteria; any failure forces [`Verdict::Fail`].
    pub structural_criteria: CriteriaMap,
    /// Reported for the reviewer, never part of the verdict.
    pub advisory_criteria: CriteriaMap,
    pub verdict: Verdict,
    /// Highest severity first.
    pub warnings: Vec<QaWarning>,
    pub statistics: QaStatistics,
    pub recommendations: Vec<String>,
    pub audit_trail: Vec<CorrectionRecord>,
    pub dictionary_version: u32,
    pub generated_at: DateTime<Utc>,
}

impl QaReport {
    pub fn fatal_failures(&self) -> impl Iterator<Item = &str> {
        self.structural_criteria
            .iter()
            .filter(|(_, o)| !o.passed())
            .map(|(id, _)| id.as_str())
    }
}

// ---------------------------------------------------------------------------
// QualityScorer
// ---------------------------------------------------------------------------

/// What the scorer needs to know about one document.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub case_id: &'a str,
    pub variant_name: &'a str,
    pub variant: &'a SectionVariant,
    /// Body text before correction (after cleaning).
    pub original_text: &'a str,
    pub outcome: &'a CorrectionOutcome,
    /// Header, corrected body and certification, as delivered.
    pub document: &'a str,
    /// Warnings raised before correction (extraction).
    pub extra_warnings: &'a [QaWarning],
}

/// Turns a correction outcome into a [`QaReport`].
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QaConfig,
}

impl QualityScorer {
    pub fn new(config: QaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// Verdict for a score when no fatal criterion failed.
    pub fn band(&self, score: u32) -> Verdict {
        if score >= self.config.pass_threshold {
            Verdict::Pass
        } else if score >= self.config.conditional_threshold {
            Verdict::PassConditional
        } else {
            Verdict::Fail
        }
    }

    pub fn score(&self, input: ScoringInput<'_>) -> QaReport {
        let score = initial_quality_score(&input.outcome.records);
        let structural = fatal_criteria(&self.config, input.variant, input.document);
        let advisory = advisory_criteria(input.variant, input.document);

        let fatal_failed = structural.values().any(|o| !o.passed());
        let verdict = if fatal_failed { Verdict::Fail } else { self.band(score) };

        let mut warnings: Vec<QaWarning> = input
            .extra_warnings
            .iter()
            .chain(input.outcome.warnings.iter())
            .cloned()
            .collect();
        warnings.sort_by(|a, b| b.severity().cmp(&a.severity()));

        let statistics = QaStatistics::compute(input.original_text, input.outcome);
        let level = QualityLevel::from_score(score, &self.config);
        let recommendations =
            self.recommendations(level, &statistics, &structural, &advisory, &warnings);

        if fatal_failed {
            warn!("QA {}: fatal criteria failed, score {score}", input.case_id);
        } else {
            info!("QA {}: score {score} → {verdict:?}", input.case_id);
        }

        QaReport {
            case_id: input.case_id.to_string(),
            variant: input.variant_name.to_string(),
            initial_quality_score: score,
            level,
            structural_criteria: structural,
            advisory_criteria: advisory,
            verdict,
            warnings,
            statistics,
            recommendations,
            audit_trail: input.outcome.records.clone(),
            dictionary_version: input.outcome.dictionary_version,
            generated_at: Utc::now(),
        }
    }

    fn recommendations(
        &self,
        level: QualityLevel,
        statistics: &QaStatistics,
        structural: &CriteriaMap,
        advisory: &CriteriaMap,
        warnings: &[QaWarning],
    ) -> Vec<String> {
        let mut out = vec![level.recommendation().to_string()];

        if statistics.critical > self.config.critical_review_threshold {
            out.push(format!(
                "Check legal terms and misrecognized vocabulary against the audio ({} critical corrections)",
                statistics.critical
            ));
        }
        for (id, outcome) in structural.iter().chain(advisory.iter()) {
            if let Some(detail) = outcome.detail.as_deref().filter(|_| !outcome.passed()) {
                out.push(format!("Fix {id}: {detail}"));
            }
        }

        let high = warnings
            .iter()
            .filter(|w| matches!(w, QaWarning::CrossValidationMismatch { .. }))
            .filter(|w| w.severity() == Severity::High)
            .count();
        if high > 0 {
            out.push(format!("Confirm case metadata ({high} high-severity mismatches)"));
        }
        if warnings
            .iter()
            .any(|w| matches!(w, QaWarning::OutOfRangeExtraction { .. }))
        {
            out.push("Check the section boundaries of the extracted reasons".to_string());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
