//! Document variants and their boundary patterns.
//!
//! A variant describes one kind of hearing document: whether only a
//! sub-section of the hearing is kept, which patterns delimit that section,
//! the expected word band and the roles its speakers map to. Variants are plain config values and are
//! persisted under `[extraction.variants.<name>]` in `settings.toml`.
//!
//! | Variant | Tribunal division | Extraction | Band |
//! |---------|-------------------|------------|------|
//! | `rpd_reasons` | Refugee Protection | reasons for decision only | 1 500 – 3 000 words |
//! | `rad_full` | Refugee Appeal | full hearing | none |
//! | `id_full` | Immigration | full hearing | none |
//! | `iad_full` | Immigration Appeal | full hearing | none |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration of one document variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionVariant {
    /// When `false` the whole utterance stream is kept and the extractor is
    /// never consulted.
    pub requires_extraction: bool,
    /// Start-of-section patterns, in priority order. Matched case-insensitively
    /// against lowercased, apostrophe-folded text.
    #[serde(default)]
    pub start_patterns: Vec<String>,
    /// End-of-section patterns. The matching utterance is not part of the
    /// section.
    #[serde(default)]
    pub end_patterns: Vec<String>,
    /// Lower bound of the expected word band.
    #[serde(default)]
    pub min_words: Option<usize>,
    /// Upper bound of the expected word band.
    #[serde(default)]
    pub max_words: Option<usize>,
    /// Title the assembled document is expected to carry.
    #[serde(default)]
    pub document_title: Option<String>,
    /// Header markers specific to this variant, checked in addition to the
    /// common ones.
    #[serde(default)]
    pub header_markers: Vec<String>,
    /// Marker closing the document body.
    #[serde(default)]
    pub closing_marker: Option<String>,
    /// Tribunal roles handed to diarization labels, most talkative first.
    #[serde(default)]
    pub speaker_roles: Vec<String>,
    /// Role for every label past the end of `speaker_roles`. When unset
    /// such labels become `LOCUTEUR <label>`.
    #[serde(default)]
    pub other_speakers: Option<String>,
}

impl SectionVariant {
    /// A variant that keeps the full stream.
    pub fn full_stream(document_title: impl Into<String>, file_marker: impl Into<String>) -> Self {
        Self {
            requires_extraction: false,
            start_patterns: Vec::new(),
            end_patterns: Vec::new(),
            min_words: None,
            max_words: None,
            document_title: Some(document_title.into()),
            header_markers: vec![file_marker.into()],
            closing_marker: None,
            speaker_roles: Vec::new(),
            other_speakers: None,
        }
    }

    /// Builder-style speaker roles.
    pub fn with_speaker_roles(mut self, roles: &[&str]) -> Self {
        self.speaker_roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    /// `true` when `words` falls inside the configured band (an unset bound
    /// never fails).
    pub fn in_band(&self, words: usize) -> bool {
        within_band(self.min_words, self.max_words, words)
    }
}

pub(crate) fn within_band(min: Option<usize>, max: Option<usize>, words: usize) -> bool {
    min.map_or(true, |min| words >= min) && max.map_or(true, |max| words <= max)
}

/// Name of the refugee-protection reasons variant.
pub const RPD_REASONS: &str = "rpd_reasons";

const PRESIDING: &str = "COMMISSAIRE";

/// Built-in variants, used when `settings.toml` does not define any.
pub fn default_variants() -> BTreeMap<String, SectionVariant> {
    let full_hearing = "Transcription complète de l'audience";

    let mut variants = BTreeMap::new();
    variants.insert(
        RPD_REASONS.to_string(),
        SectionVariant {
            requires_extraction: true,
            start_patterns: [
                r"donc,?\s*j'ai eu aujourd'hui à examiner",
                r"voici les? motifs? de (ma|la) décision",
                r"ma décision aujourd'hui,?\s*c'est que",
                r"je vais (maintenant|directement) vous donner (ma|les) décision",
                r"je rends ma décision",
                r"alors,?\s*voici (ma|les) décision",
                r"j'ai rendu ma décision",
                r"je vous annonce ma décision",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            end_patterns: [
                r"merci pour votre témoignage",
                r"l'audience est (terminée|levée|ajournée)",
                r"je vous remercie pour votre travail",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            min_words: Some(1_500),
            max_words: Some(3_000),
            document_title: Some("TRANSCRIPTION DES Motifs".into()),
            header_markers: vec!["RPD File".into()],
            closing_marker: Some("FIN DES MOTIFS".into()),
            speaker_roles: vec![PRESIDING.into()],
            other_speakers: Some("AUTRE".into()),
        },
    );
    variants.insert(
        "rad_full".into(),
        SectionVariant::full_stream(full_hearing, "RAD File").with_speaker_roles(&[
            PRESIDING,
            "DEMANDEUR D'ASILE",
            "CONSEIL",
            "INTERPRÈTE",
            "REPRÉSENTANT DU MINISTRE",
        ]),
    );
    variants.insert(
        "id_full".into(),
        SectionVariant::full_stream(full_hearing, "ID File").with_speaker_roles(&[
            PRESIDING,
            "PERSONNE CONCERNÉE",
            "CONSEIL",
            "REPRÉSENTANT DU MINISTRE",
            "INTERPRÈTE",
        ]),
    );
    variants.insert(
        "iad_full".into(),
        SectionVariant::full_stream(full_hearing, "IAD File").with_speaker_roles(&[
            PRESIDING,
            "APPELANT",
            "CONSEIL DE L'APPELANT",
            "REPRÉSENTANT DU MINISTRE",
            "INTERPRÈTE",
        ]),
    );
    variants
}
