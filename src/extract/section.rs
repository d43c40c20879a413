//! Boundary detection over an utterance stream.

use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::text::normalize_for_matching;
use crate::transcript::{join_text, total_words, Utterance};

use super::variant::{within_band, SectionVariant};
use super::ExtractError;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome class of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Ok,
    NotFound,
    /// Section found but its word count is outside the variant's band.
    OutOfRange,
}

/// Where the section sits in the stream. `end_index` is inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub start_index: usize,
    pub end_index: usize,
    pub word_count: usize,
    pub status: ExtractionStatus,
}

/// A located section together with its text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSection {
    pub result: ExtractionResult,
    /// Section text, one utterance per line.
    pub text: String,
    /// Start pattern that opened the section.
    pub matched_pattern: String,
    /// `false` when the section runs to the end of the stream.
    pub end_marker_found: bool,
}

impl ExtractedSection {
    /// The utterances covered by this section.
    pub fn utterances<'a>(&self, stream: &'a [Utterance]) -> &'a [Utterance] {
        &stream[self.result.start_index..=self.result.end_index]
    }

    pub fn is_out_of_range(&self) -> bool {
        self.result.status == ExtractionStatus::OutOfRange
    }
}

/// Result of a boundary search. There is deliberately no fallback to the
/// whole stream: callers must handle `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionLookup {
    Found(ExtractedSection),
    NotFound,
}

impl SectionLookup {
    /// Convert into a `Result`, mapping `NotFound` to
    /// [`ExtractError::BoundaryNotFound`] for `variant`.
    pub fn into_result(self, variant: &str) -> Result<ExtractedSection, ExtractError> {
        match self {
            SectionLookup::Found(section) => Ok(section),
            SectionLookup::NotFound => Err(ExtractError::BoundaryNotFound {
                variant: variant.to_string(),
            }),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SectionLookup::Found(_))
    }
}

// ---------------------------------------------------------------------------
// SectionExtractor
// ---------------------------------------------------------------------------

/// Compiled boundary patterns for one variant.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    start: Vec<Regex>,
    end: Vec<Regex>,
    min_words: Option<usize>,
    max_words: Option<usize>,
}

impl SectionExtractor {
    /// Compile the variant's patterns.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InvalidPattern`] for the first pattern that fails to
    /// compile, and [`ExtractError::NoStartPatterns`] when the variant has
    /// none.
    pub fn from_variant(variant: &SectionVariant) -> Result<Self, ExtractError> {
        if variant.start_patterns.is_empty() {
            return Err(ExtractError::NoStartPatterns);
        }
        Ok(Self {
            start: compile_all(&variant.start_patterns)?,
            end: compile_all(&variant.end_patterns)?,
            min_words: variant.min_words,
            max_words: variant.max_words,
        })
    }

    /// Find the section.
    ///
    /// The section opens at the first utterance matching any start pattern
    /// and closes just before the first later utterance matching any end
    /// pattern (or at the end of the stream).
    ///
    /// ```
    /// use transcript_qa::extract::{default_variants, SectionExtractor, SectionLookup};
    /// use transcript_qa::transcript::Utterance;
    ///
    /// let extractor = SectionExtractor::from_variant(&default_variants()["rpd_reasons"]).unwrap();
    /// let stream: Vec<Utterance> = [
    ///     "Bonjour à tous.",
    ///     "Voici les motifs de la décision.",
    ///     "Premier motif...",
    ///     "Merci pour votre témoignage.",
    /// ]
    /// .into_iter()
    /// .map(Utterance::new)
    /// .collect();
    ///
    /// let SectionLookup::Found(section) = extractor.locate(&stream) else { panic!() };
    /// assert_eq!((section.result.start_index, section.result.end_index), (1, 2));
    /// ```
    pub fn locate(&self, utterances: &[Utterance]) -> SectionLookup {
        let normalized: Vec<String> = utterances
            .iter()
            .map(|u| normalize_for_matching(&u.text))
            .collect();

        let Some((start_index, matched_pattern)) =
            normalized.iter().enumerate().find_map(|(i, text)| {
                self.start
                    .iter()
                    .find(|re| re.is_match(text))
                    .map(|re| (i, re.as_str().to_string()))
            })
        else {
            warn!(
                "No section start found in {} utterances ({} patterns)",
                utterances.len(),
                self.start.len()
            );
            return SectionLookup::NotFound;
        };

        let end_marker = normalized
            .iter()
            .enumerate()
            .skip(start_index + 1)
            .find(|(_, text)| self.end.iter().any(|re| re.is_match(text)))
            .map(|(i, _)| i);

        let end_index = match end_marker {
            Some(marker) => marker - 1,
            None => utterances.len() - 1,
        };

        let covered = &utterances[start_index..=end_index];
        let word_count = total_words(covered);
        let status = if self.in_band(word_count) {
            ExtractionStatus::Ok
        } else {
            warn!(
                "Extracted section has {} words, outside {:?}..={:?}",
                word_count, self.min_words, self.max_words
            );
            ExtractionStatus::OutOfRange
        };

        info!(
            "Section found: utterances {}..={} ({} words, end marker: {})",
            start_index,
            end_index,
            word_count,
            end_marker.is_some()
        );
        debug!("Section opened by pattern {matched_pattern:?}");

        SectionLookup::Found(ExtractedSection {
            result: ExtractionResult {
                start_index,
                end_index,
                word_count,
                status,
            },
            text: join_text(covered),
            matched_pattern,
            end_marker_found: end_marker.is_some(),
        })
    }

    fn in_band(&self, words: usize) -> bool {
        within_band(self.min_words, self.max_words, words)
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ExtractError> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|source| ExtractError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{default_variants, RPD_REASONS};

    fn stream(texts: &[&str]) -> Vec<Utterance> {
        texts.iter().map(|t| Utterance::new(*t)).collect()
    }

    fn rpd() -> SectionExtractor {
        SectionExtractor::from_variant(&default_variants()[RPD_REASONS]).unwrap()
    }

    fn unbounded() -> SectionExtractor {
        let mut variant = default_variants()[RPD_REASONS].clone();
        variant.min_words = None;
        variant.max_words = None;
        SectionExtractor::from_variant(&variant).unwrap()
    }

    #[test]
    fn finds_section_between_markers() {
        let utterances = stream(&[
            "Bonjour à tous.",
            "Voici les motifs de la décision.",
            "Premier motif...",
            "Merci pour votre témoignage.",
        ]);
        let section = unbounded().locate(&utterances).into_result(RPD_REASONS).unwrap();
        assert_eq!(section.result.start_index, 1);
        assert_eq!(section.result.end_index, 2);
        assert_eq!(section.result.status, ExtractionStatus::Ok);
        assert_eq!(section.text, "Voici les motifs de la décision.\nPremier motif...");
        assert!(section.end_marker_found);
        assert_eq!(section.utterances(&utterances).len(), 2);
    }

    #[test]
    fn no_start_is_not_found() {
        let utterances = stream(&["Bonjour à tous.", "Merci pour votre témoignage."]);
        let lookup = rpd().locate(&utterances);
        assert_eq!(lookup, SectionLookup::NotFound);
        let err = lookup.into_result(RPD_REASONS).unwrap_err();
        assert!(matches!(err, ExtractError::BoundaryNotFound { .. }), "{err}");
    }

    #[test]
    fn empty_stream_is_not_found() {
        assert!(!rpd().locate(&[]).is_found());
    }

    #[test]
    fn runs_to_end_without_end_marker() {
        let utterances = stream(&["Intro", "Je rends ma décision.", "Motif un.", "Motif deux."]);
        let section = unbounded().locate(&utterances).into_result(RPD_REASONS).unwrap();
        assert_eq!((section.result.start_index, section.result.end_index), (1, 3));
        assert!(!section.end_marker_found);
    }

    #[test]
    fn end_marker_before_start_is_ignored() {
        let utterances = stream(&[
            "L'audience est ajournée pour dix minutes.",
            "Alors, voici ma décision.",
            "Motif.",
            "L'audience est terminée.",
        ]);
        let section = unbounded().locate(&utterances).into_result(RPD_REASONS).unwrap();
        assert_eq!((section.result.start_index, section.result.end_index), (1, 2));
    }

    #[test]
    fn matches_curly_apostrophes_and_case() {
        let utterances = stream(&["DONC, J’AI EU AUJOURD’HUI À EXAMINER votre demande.", "Fin."]);
        let section = unbounded().locate(&utterances).into_result(RPD_REASONS).unwrap();
        assert_eq!(section.result.start_index, 0);
        assert_eq!(section.matched_pattern, r"donc,?\s*j'ai eu aujourd'hui à examiner");
    }

    #[test]
    fn earliest_utterance_wins_over_pattern_priority() {
        // "je rends ma décision" has lower priority than "voici les motifs"
        // but occurs first.
        let utterances = stream(&["Je rends ma décision.", "Voici les motifs de ma décision.", "x"]);
        let section = unbounded().locate(&utterances).into_result(RPD_REASONS).unwrap();
        assert_eq!(section.result.start_index, 0);
        assert_eq!(section.matched_pattern, "je rends ma décision");
    }

    #[test]
    fn short_section_is_out_of_range_but_returned() {
        let utterances = stream(&["Voici les motifs de la décision.", "Court."]);
        let section = rpd().locate(&utterances).into_result(RPD_REASONS).unwrap();
        assert!(section.is_out_of_range());
        assert_eq!(section.result.word_count, 7);
        assert!(!section.text.is_empty());
    }

    #[test]
    fn in_band_section_is_ok() {
        let body = "mot ".repeat(2_000);
        let utterances = stream(&["Je rends ma décision.", body.trim()]);
        let section = rpd().locate(&utterances).into_result(RPD_REASONS).unwrap();
        assert_eq!(section.result.status, ExtractionStatus::Ok);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let mut variant = default_variants()[RPD_REASONS].clone();
        variant.start_patterns.push("(unclosed".into());
        let err = SectionExtractor::from_variant(&variant).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidPattern { .. }), "{err}");
    }

    #[test]
    fn variant_without_start_patterns_is_rejected() {
        let mut variant = default_variants()[RPD_REASONS].clone();
        variant.start_patterns.clear();
        assert!(matches!(
            SectionExtractor::from_variant(&variant),
            Err(ExtractError::NoStartPatterns)
        ));
    }
}
