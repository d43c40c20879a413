//! The fixed correction taxonomy.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CorrectionCategory
// ---------------------------------------------------------------------------

/// Closed set of correction categories.
///
/// The declaration order *is* the canonical pass order, so the derived `Ord`
/// sorts categories the way the correction engine runs them:
///
/// | # | Category | Score weight |
/// |---|----------|--------------|
/// | 1 | `LegalTerms` | critical (2) |
/// | 2 | `ProperNounsDiacritics` | moderate (1) |
/// | 3 | `GrammaticalAgreement` | moderate (1) |
/// | 4 | `MisrecognizedVocabulary` | critical (2) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionCategory {
    /// Statutory articles, legal expressions, tribunal vocabulary.
    LegalTerms,
    /// Proper nouns and restored accents (`Michoacan` → `Michoacán`).
    ProperNounsDiacritics,
    /// Gender/number agreement (`citoyen` → `citoyenne`).
    GrammaticalAgreement,
    /// Phonetic confusions from the recognizer (`affairement` → `avortement`).
    MisrecognizedVocabulary,
}

impl CorrectionCategory {
    /// Pass order used by the correction engine.
    pub const CANONICAL_ORDER: [CorrectionCategory; 4] = [
        CorrectionCategory::LegalTerms,
        CorrectionCategory::ProperNounsDiacritics,
        CorrectionCategory::GrammaticalAgreement,
        CorrectionCategory::MisrecognizedVocabulary,
    ];

    /// `true` for the categories counted as critical by the quality score.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            CorrectionCategory::LegalTerms | CorrectionCategory::MisrecognizedVocabulary
        )
    }

    /// Points deducted from the initial quality score per correction.
    pub fn weight(&self) -> u32 {
        if self.is_critical() {
            2
        } else {
            1
        }
    }

    /// 1-based pass number in the canonical order.
    pub fn pass_number(&self) -> u8 {
        match self {
            CorrectionCategory::LegalTerms => 1,
            CorrectionCategory::ProperNounsDiacritics => 2,
            CorrectionCategory::GrammaticalAgreement => 3,
            CorrectionCategory::MisrecognizedVocabulary => 4,
        }
    }

    /// Stable snake_case identifier (matches the serde representation).
    pub fn key(&self) -> &'static str {
        match self {
            CorrectionCategory::LegalTerms => "legal_terms",
            CorrectionCategory::ProperNounsDiacritics => "proper_nouns_diacritics",
            CorrectionCategory::GrammaticalAgreement => "grammatical_agreement",
            CorrectionCategory::MisrecognizedVocabulary => "misrecognized_vocabulary",
        }
    }

    /// Key used for this category by dictionaries written before the
    /// categories were renamed.
    pub fn legacy_key(&self) -> &'static str {
        match self {
            CorrectionCategory::LegalTerms => "pass1_termes_juridiques",
            CorrectionCategory::ProperNounsDiacritics => "pass2_noms_propres_accents",
            CorrectionCategory::GrammaticalAgreement => "pass3_accords_grammaticaux",
            CorrectionCategory::MisrecognizedVocabulary => "pass4_mots_mal_reconnus",
        }
    }
}

impl std::fmt::Display for CorrectionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ord_follows_canonical_order() {
        let mut shuffled = vec![
            CorrectionCategory::MisrecognizedVocabulary,
            CorrectionCategory::LegalTerms,
            CorrectionCategory::GrammaticalAgreement,
            CorrectionCategory::ProperNounsDiacritics,
        ];
        shuffled.sort();
        assert_eq!(shuffled, CorrectionCategory::CANONICAL_ORDER.to_vec());
    }

    #[test]
    fn weights() {
        assert_eq!(CorrectionCategory::LegalTerms.weight(), 2);
        assert_eq!(CorrectionCategory::MisrecognizedVocabulary.weight(), 2);
        assert_eq!(CorrectionCategory::ProperNounsDiacritics.weight(), 1);
        assert_eq!(CorrectionCategory::GrammaticalAgreement.weight(), 1);
    }

    #[test]
    fn pass_numbers_match_order() {
        for (i, cat) in CorrectionCategory::CANONICAL_ORDER.iter().enumerate() {
            assert_eq!(cat.pass_number() as usize, i + 1);
        }
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        for cat in CorrectionCategory::CANONICAL_ORDER {
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!("\"{}\"", cat.key()));
        }
    }
}
