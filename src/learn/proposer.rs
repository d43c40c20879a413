//! Reference-driven dictionary proposals.
//!
//! [`LearningProposer`] aligns a raw machine transcript with its
//! human-verified reference and turns every replaced stretch into a
//! candidate entry. Candidates go through the filters (in this order):
//!
//! 1. blacklist of short function words, whatever the similarity
//! 2. both sides at least `min_token_chars` long
//! 3. similarity ≥ `similarity_threshold`
//! 4. not a punctuation-only or case-only difference
//!
//! Survivors are classified, checked against the dictionary and collapsed
//! per document into [`LearningProposal`]s awaiting human review.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::LearningConfig;
use crate::dictionary::{CorrectionCategory, Dictionary};
use crate::text::{tokenize, Token};

use super::align::{align, common_tokens, HunkKind};
use super::classify::CategoryClassifier;
use super::similarity::ratio;
use super::LearnError;

// ---------------------------------------------------------------------------
// Candidate / filtering
// ---------------------------------------------------------------------------

/// A raw `(incorrect, correct)` pair taken from one replace hunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub incorrect: String,
    pub correct: String,
    pub similarity: f64,
    /// Raw-text tokens around the hunk.
    pub context: String,
}

impl Candidate {
    /// Build a candidate, computing its similarity.
    pub fn new(incorrect: impl Into<String>, correct: impl Into<String>, context: impl Into<String>) -> Self {
        let incorrect = incorrect.into();
        let correct = correct.into();
        let similarity = ratio(&incorrect, &correct);
        Self {
            incorrect,
            correct,
            similarity,
            context: context.into(),
        }
    }
}

/// Why a candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Blacklisted,
    TooShort,
    /// Similarity below the threshold.
    LowConfidence,
    /// Only punctuation or letter case differs.
    Cosmetic,
    /// Hunk spans more tokens than a dictionary entry should.
    Oversized,
    /// Same category and `incorrect` already in the dictionary.
    AlreadyKnown,
}

/// Per-reason counts of discarded candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTally {
    pub blacklisted: usize,
    pub too_short: usize,
    pub low_confidence: usize,
    pub cosmetic: usize,
    pub oversized: usize,
    pub already_known: usize,
}

impl FilterTally {
    pub fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Blacklisted => self.blacklisted += 1,
            Rejection::TooShort => self.too_short += 1,
            Rejection::LowConfidence => self.low_confidence += 1,
            Rejection::Cosmetic => self.cosmetic += 1,
            Rejection::Oversized => self.oversized += 1,
            Rejection::AlreadyKnown => self.already_known += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.blacklisted
            + self.too_short
            + self.low_confidence
            + self.cosmetic
            + self.oversized
            + self.already_known
    }

    pub fn absorb(&mut self, other: &FilterTally) {
        self.blacklisted += other.blacklisted;
        self.too_short += other.too_short;
        self.low_confidence += other.low_confidence;
        self.cosmetic += other.cosmetic;
        self.oversized += other.oversized;
        self.already_known += other.already_known;
    }
}

// ---------------------------------------------------------------------------
// LearningProposal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A proposed dictionary entry awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProposal {
    pub incorrect: String,
    pub correct: String,
    pub similarity: f64,
    pub category: CorrectionCategory,
    pub context: String,
    /// How many times the same pair was seen.
    pub occurrences: usize,
    pub status: ProposalStatus,
    /// Case the pair was first learned from.
    pub source_case_id: String,
}

impl LearningProposal {
    pub fn accept(&mut self) {
        self.status = ProposalStatus::Accepted;
    }

    pub fn reject(&mut self) {
        self.status = ProposalStatus::Rejected;
    }

    fn key(&self) -> (CorrectionCategory, String, String) {
        (self.category, self.incorrect.clone(), self.correct.clone())
    }
}

/// Proposals learned from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalBatch {
    pub case_id: String,
    pub proposals: Vec<LearningProposal>,
    pub tally: FilterTally,
    /// Number of replace hunks examined.
    pub candidates_seen: usize,
}

/// One raw/reference pair for batch learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePair {
    pub case_id: String,
    pub raw: String,
    pub reference: String,
}

/// Result of learning over many documents. A failing document never stops
/// the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningRun {
    /// Proposals collapsed across documents.
    pub proposals: Vec<LearningProposal>,
    pub tally: FilterTally,
    pub documents: usize,
    /// `(case_id, error message)` per failed document.
    pub failures: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// LearningProposer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LearningProposer {
    config: LearningConfig,
    blacklist: Vec<String>,
    anchors: Vec<String>,
    classifier: CategoryClassifier,
}

impl LearningProposer {
    pub fn new(config: LearningConfig) -> Self {
        let lower = |words: &[String]| words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>();
        Self {
            blacklist: lower(&config.blacklist),
            anchors: lower(&config.anchor_tokens),
            classifier: CategoryClassifier::new(&config.legal_markers),
            config,
        }
    }

    /// Run the candidate filters, returning the first rejection reason.
    ///
    /// The blacklist check comes first so that function words are dropped
    /// even at high similarity.
    pub fn check(&self, candidate: &Candidate) -> Result<(), Rejection> {
        let incorrect = candidate.incorrect.to_lowercase();
        let correct = candidate.correct.to_lowercase();

        if self.blacklist.contains(&incorrect) || self.blacklist.contains(&correct) {
            return Err(Rejection::Blacklisted);
        }
        let min = self.config.min_token_chars;
        if candidate.incorrect.chars().count() < min || candidate.correct.chars().count() < min {
            return Err(Rejection::TooShort);
        }
        if candidate.similarity < self.config.similarity_threshold {
            return Err(Rejection::LowConfidence);
        }
        if significant(&candidate.incorrect) == significant(&candidate.correct) {
            return Err(Rejection::Cosmetic);
        }
        Ok(())
    }

    /// Classify a candidate that passed the filters.
    pub fn classify(&self, candidate: &Candidate) -> CorrectionCategory {
        self.classifier.classify(&candidate.incorrect, &candidate.correct)
    }

    /// Learn from one raw/reference pair.
    ///
    /// # Errors
    ///
    /// - [`LearnError::EmptyTranscript`] / [`LearnError::EmptyReference`]
    ///   when either side has no tokens.
    /// - [`LearnError::UnrelatedReference`] when the two texts share too few
    ///   tokens to be the same hearing.
    pub fn propose(
        &self,
        case_id: &str,
        raw: &str,
        reference: &str,
        dictionary: &Dictionary,
    ) -> Result<ProposalBatch, LearnError> {
        let raw_tokens = tokenize(raw);
        let ref_tokens = tokenize(reference);
        if raw_tokens.is_empty() {
            return Err(LearnError::EmptyTranscript {
                case_id: case_id.to_string(),
            });
        }
        if ref_tokens.is_empty() {
            return Err(LearnError::EmptyReference {
                case_id: case_id.to_string(),
            });
        }

        let a: Vec<&str> = raw_tokens.iter().map(|t| t.text.as_str()).collect();
        let b: Vec<&str> = ref_tokens.iter().map(|t| t.text.as_str()).collect();
        let hunks = align(&a, &b);

        let overlap = common_tokens(&hunks) as f64 / a.len().max(b.len()) as f64;
        if overlap < self.config.min_alignment {
            return Err(LearnError::UnrelatedReference {
                case_id: case_id.to_string(),
                overlap,
            });
        }

        let mut tally = FilterTally::default();
        let mut proposals: BTreeMap<(CorrectionCategory, String, String), LearningProposal> =
            BTreeMap::new();
        let mut order: Vec<(CorrectionCategory, String, String)> = Vec::new();
        let mut candidates_seen = 0;

        for hunk in hunks.iter().filter(|h| h.kind == HunkKind::Replace) {
            candidates_seen += 1;

            if hunk.a.len() > self.config.max_hunk_tokens || hunk.b.len() > self.config.max_hunk_tokens {
                tally.record(Rejection::Oversized);
                continue;
            }

            let mut incorrect = a[hunk.a.clone()].join(" ");
            let mut correct = b[hunk.b.clone()].join(" ");
            if let Some(anchor) = self.anchor_before(&a, &b, hunk.a.start, hunk.b.start) {
                incorrect = format!("{anchor} {incorrect}");
                correct = format!("{anchor} {correct}");
            }

            let context = self.context(&raw_tokens, hunk.a.start, hunk.a.end);
            let candidate = Candidate::new(incorrect, correct, context);

            if let Err(rejection) = self.check(&candidate) {
                debug!(
                    "Candidate {:?} → {:?} ({:.2}) rejected: {:?}",
                    candidate.incorrect, candidate.correct, candidate.similarity, rejection
                );
                tally.record(rejection);
                continue;
            }

            let category = self.classify(&candidate);
            if dictionary.contains(category, &candidate.incorrect) {
                tally.record(Rejection::AlreadyKnown);
                continue;
            }

            let proposal = LearningProposal {
                incorrect: candidate.incorrect,
                correct: candidate.correct,
                similarity: candidate.similarity,
                category,
                context: candidate.context,
                occurrences: 1,
                status: ProposalStatus::Pending,
                source_case_id: case_id.to_string(),
            };
            let key = proposal.key();
            match proposals.get_mut(&key) {
                Some(existing) => existing.occurrences += 1,
                None => {
                    order.push(key.clone());
                    proposals.insert(key, proposal);
                }
            }
        }

        let proposals: Vec<LearningProposal> =
            order.iter().filter_map(|k| proposals.remove(k)).collect();

        info!(
            "Learning {}: {} hunks, {} proposals, {} filtered",
            case_id,
            candidates_seen,
            proposals.len(),
            tally.total()
        );

        Ok(ProposalBatch {
            case_id: case_id.to_string(),
            proposals,
            tally,
            candidates_seen,
        })
    }

    /// Learn from many documents, collapsing identical proposals across them.
    pub fn propose_all(&self, pairs: &[ReferencePair], dictionary: &Dictionary) -> LearningRun {
        let mut run = LearningRun {
            documents: pairs.len(),
            ..Default::default()
        };

        for pair in pairs {
            match self.propose(&pair.case_id, &pair.raw, &pair.reference, dictionary) {
                Ok(batch) => {
                    run.tally.absorb(&batch.tally);
                    for proposal in batch.proposals {
                        match run.proposals.iter_mut().find(|p| p.key() == proposal.key()) {
                            Some(existing) => existing.occurrences += proposal.occurrences,
                            None => run.proposals.push(proposal),
                        }
                    }
                }
                Err(e) => {
                    warn!("Learning skipped for {}: {e}", pair.case_id);
                    run.failures.push((pair.case_id.clone(), e.to_string()));
                }
            }
        }
        run
    }

    /// Legal anchor shared by both sides just before the hunk.
    fn anchor_before<'a>(&self, a: &[&'a str], b: &[&str], a_start: usize, b_start: usize) -> Option<&'a str> {
        let prev_a = *a.get(a_start.checked_sub(1)?)?;
        let prev_b = *b.get(b_start.checked_sub(1)?)?;
        (prev_a == prev_b && self.anchors.contains(&prev_a.to_lowercase())).then_some(prev_a)
    }

    fn context(&self, tokens: &[Token], start: usize, end: usize) -> String {
        let from = start.saturating_sub(self.config.context_window);
        let to = (end + self.config.context_window).min(tokens.len());
        tokens[from..to]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for LearningProposer {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}

/// Lowercased alphanumeric content, used to spot cosmetic differences.
fn significant(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
