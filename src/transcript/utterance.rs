//! Utterance stream types handed over by the speech-to-text collaborator.

use serde::{Deserialize, Serialize};

use crate::text::word_count;

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// One speaker turn (or ASR-segmented span) with its timing offsets.
///
/// The core never mutates an utterance; streams are passed as `&[Utterance]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Diarization label (`"A"`, `"B"` …) when the ASR service provides one.
    #[serde(default)]
    pub speaker_tag: Option<String>,
    /// Raw recognized text.
    pub text: String,
    /// Start offset in milliseconds from the start of the recording.
    #[serde(default)]
    pub start_offset: i64,
    /// End offset in milliseconds from the start of the recording.
    #[serde(default)]
    pub end_offset: i64,
}

impl Utterance {
    /// Build an untagged utterance with zero offsets (mostly for tests and
    /// plain-text inputs).
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            speaker_tag: None,
            text: text.into(),
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Builder-style speaker tag.
    pub fn with_speaker(mut self, tag: impl Into<String>) -> Self {
        self.speaker_tag = Some(tag.into());
        self
    }

    /// Builder-style offsets.
    pub fn with_offsets(mut self, start: i64, end: i64) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

// ---------------------------------------------------------------------------
// Helpers over utterance slices
// ---------------------------------------------------------------------------

/// Concatenate utterance texts, one utterance per line, trimming each.
pub fn join_text(utterances: &[Utterance]) -> String {
    utterances
        .iter()
        .map(|u| u.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Total word count across a slice of utterances.
pub fn total_words(utterances: &[Utterance]) -> usize {
    utterances.iter().map(Utterance::word_count).sum()
}

/// Wall-clock span covered by the slice, in milliseconds.
///
/// Returns `0` for an empty slice.
pub fn span_ms(utterances: &[Utterance]) -> i64 {
    match (utterances.first(), utterances.last()) {
        (Some(first), Some(last)) => (last.end_offset - first.start_offset).max(0),
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_skips_blank_utterances() {
        let stream = vec![
            Utterance::new(" Bonjour. "),
            Utterance::new("   "),
            Utterance::new("Merci."),
        ];
        assert_eq!(join_text(&stream), "Bonjour.\nMerci.");
    }

    #[test]
    fn counts_words_across_stream() {
        let stream = vec![Utterance::new("un deux"), Utterance::new("trois")];
        assert_eq!(total_words(&stream), 3);
    }

    #[test]
    fn span_uses_first_start_and_last_end() {
        let stream = vec![
            Utterance::new("a").with_offsets(1_000, 2_000),
            Utterance::new("b").with_offsets(2_500, 9_000),
        ];
        assert_eq!(span_ms(&stream), 8_000);
        assert_eq!(span_ms(&[]), 0);
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let u: Utterance = serde_json::from_str(r#"{"text":"Bonjour"}"#).unwrap();
        assert_eq!(u.text, "Bonjour");
        assert!(u.speaker_tag.is_none());
        assert_eq!(u.start_offset, 0);
    }

    #[test]
    fn speaker_builder() {
        let u = Utterance::new("Oui.").with_speaker("A");
        assert_eq!(u.speaker_tag.as_deref(), Some("A"));
    }
}
