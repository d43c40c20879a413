//! Ordered dictionary-driven substitution passes.

use std::sync::Arc;

use log::{debug, info};

use crate::dictionary::{CorrectionCategory, Dictionary};
use crate::text::{match_forms, whole_word_matches, MatchForm};

use super::crossval::{cross_validate, ExpectedEntity};
use super::{CorrectionOutcome, CorrectionRecord};

// ---------------------------------------------------------------------------
// Internal types
// ---------------------------------------------------------------------------

/// An accepted replacement, in byte coordinates of the pass input.
struct Hit {
    start: usize,
    end: usize,
    replace: String,
}

// ---------------------------------------------------------------------------
// CorrectionEngine
// ---------------------------------------------------------------------------

/// Runs the four correction passes against one dictionary snapshot.
///
/// The engine never touches the store: it holds an `Arc<Dictionary>` taken
/// when the run started, so a concurrent commit cannot change a document
/// halfway through.
#[derive(Debug, Clone)]
pub struct CorrectionEngine {
    dictionary: Arc<Dictionary>,
}

impl CorrectionEngine {
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Run every pass in canonical order, then cross-validate.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use transcript_qa::correct::CorrectionEngine;
    /// use transcript_qa::dictionary::{CorrectionCategory, Dictionary, DictionaryEntry};
    ///
    /// let dict = Dictionary::from_entries([
    ///     DictionaryEntry::new(CorrectionCategory::LegalTerms, "en virtu", "en vertu"),
    /// ])
    /// .unwrap();
    /// let engine = CorrectionEngine::new(Arc::new(dict));
    ///
    /// let outcome = engine.correct("Décision rendue en virtu de la loi.", &[]);
    /// assert_eq!(outcome.text, "Décision rendue en vertu de la loi.");
    /// assert_eq!(outcome.records.len(), 1);
    ///
    /// // Already corrected text is left alone.
    /// assert!(engine.correct(&outcome.text, &[]).records.is_empty());
    /// ```
    pub fn correct(&self, text: &str, expected: &[ExpectedEntity]) -> CorrectionOutcome {
        let mut current = text.to_string();
        let mut records = Vec::new();

        for category in CorrectionCategory::CANONICAL_ORDER {
            let (next, pass_records) = self.run_pass(category, &current);
            current = next;
            records.extend(pass_records);
        }

        let warnings = cross_validate(&current, expected);

        info!(
            "Corrections applied: {} (dictionary v{}, {} cross-validation warnings)",
            records.len(),
            self.dictionary.version(),
            warnings.len()
        );

        CorrectionOutcome {
            text: current,
            records,
            warnings,
            dictionary_version: self.dictionary.version(),
        }
    }

    /// Run a single pass over `text`.
    ///
    /// Entries are tried longest `incorrect` first (ties broken
    /// lexicographically). Each occurrence is replaced at most once per pass:
    /// text produced by one entry is not rescanned by another entry of the
    /// same pass. Record positions are character offsets into the returned
    /// text.
    pub fn run_pass(&self, category: CorrectionCategory, text: &str) -> (String, Vec<CorrectionRecord>) {
        let mut entries: Vec<(&str, &str)> = self
            .dictionary
            .terms(category)
            .map(|(incorrect, record)| (incorrect, record.correct.as_str()))
            .collect();
        if entries.is_empty() {
            debug!("Pass {} ({category}): dictionary empty", category.pass_number());
            return (text.to_string(), Vec::new());
        }
        entries.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.cmp(b.0))
        });

        let mut hits: Vec<Hit> = Vec::new();
        for (incorrect, correct) in &entries {
            for form in match_forms(incorrect, correct) {
                collect_hits(text, &form, &mut hits);
            }
        }
        hits.sort_by_key(|h| h.start);

        let mut output = String::with_capacity(text.len());
        let mut records = Vec::with_capacity(hits.len());
        let mut cursor = 0usize;
        let mut out_chars = 0usize;

        for hit in hits {
            let unchanged = &text[cursor..hit.start];
            output.push_str(unchanged);
            out_chars += unchanged.chars().count();

            records.push(CorrectionRecord {
                pass: category,
                position: out_chars,
                before: text[hit.start..hit.end].to_string(),
                after: hit.replace.clone(),
            });

            output.push_str(&hit.replace);
            out_chars += hit.replace.chars().count();
            cursor = hit.end;
        }
        output.push_str(&text[cursor..]);

        debug!(
            "Pass {} ({category}): {} entries, {} replacements",
            category.pass_number(),
            entries.len(),
            records.len()
        );
        (output, records)
    }
}

// ---------------------------------------------------------------------------
// Matching helpers
// ---------------------------------------------------------------------------

/// Append every valid occurrence of `form` in `text` to `hits` unless it
/// overlaps an occurrence accepted earlier.
fn collect_hits(text: &str, form: &MatchForm, hits: &mut Vec<Hit>) {
    for (start, end) in whole_word_matches(text, form) {
        if hits.iter().any(|h| start < h.end && h.start < end) {
            continue;
        }
        hits.push(Hit {
            start,
            end,
            replace: form.replace.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
