//! Candidate classification and the built-in word lists.
//!
//! [`CategoryClassifier`] maps a candidate pair onto exactly one
//! [`CorrectionCategory`]. Rules are tried in order and the first one that
//! fires wins:
//!
//! | # | Rule | Category |
//! |---|------|----------|
//! | 1 | either side contains a legal marker | `LegalTerms` |
//! | 2 | equal once accents and case are folded | `ProperNounsDiacritics` |
//! | 3 | equal once gender/number endings are stripped | `GrammaticalAgreement` |
//! | 4 | anything else | `MisrecognizedVocabulary` |

use crate::dictionary::CorrectionCategory;
use crate::text::fold;

// ---------------------------------------------------------------------------
// Built-in lists
// ---------------------------------------------------------------------------

/// Substrings that mark a legal term.
pub static DEFAULT_LEGAL_MARKERS: &[&str] = &[
    "article",
    "paragraphe",
    "alinéa",
    "lipr",
    "loi sur",
    "règlement",
    "convention",
    "protection des réfugiés",
    "crainte fondée",
    "persécution",
    "tribunal",
];

/// Short function words that are never learned, whatever their similarity.
pub static DEFAULT_BLACKLIST: &[&str] = &[
    "de", "des", "du", "le", "la", "les", "un", "une", "et", "ou", "à", "au", "aux", "en",
    "il", "elle", "ils", "elles", "je", "tu", "on", "nous", "vous", "ce", "ces", "cet",
    "cette", "que", "qui", "ne", "pas", "se", "sa", "son", "ses", "mon", "ma", "mes",
    "est", "a", "y", "l'", "d'",
];

/// Tokens that give a following number its meaning (`article 87`).
pub static DEFAULT_ANCHOR_TOKENS: &[&str] = &["article", "articles", "paragraphe", "alinéa", "section"];

/// French gender/number endings, longest first, with what they reduce to.
static AGREEMENT_ENDINGS: &[(&str, &str)] = &[
    ("nnes", "n"),
    ("nne", "n"),
    ("lles", "l"),
    ("lle", "l"),
    ("ttes", "t"),
    ("tte", "t"),
    ("ives", "if"),
    ("ive", "if"),
    ("aux", "al"),
    ("es", ""),
    ("e", ""),
    ("s", ""),
    ("x", ""),
];

/// Shortest stem left after stripping an ending.
const MIN_STEM_CHARS: usize = 3;

// ---------------------------------------------------------------------------
// CategoryClassifier
// ---------------------------------------------------------------------------

/// Total classification function over candidate pairs.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    legal_markers: Vec<String>,
}

impl CategoryClassifier {
    pub fn new(legal_markers: &[String]) -> Self {
        Self {
            legal_markers: legal_markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    /// Classify `incorrect → correct`.
    ///
    /// ```
    /// use transcript_qa::dictionary::CorrectionCategory;
    /// use transcript_qa::learn::CategoryClassifier;
    ///
    /// let c = CategoryClassifier::default();
    /// assert_eq!(c.classify("paragraphe 87", "paragraphe 97(1)"), CorrectionCategory::LegalTerms);
    /// assert_eq!(c.classify("Michoacan", "Michoacán"), CorrectionCategory::ProperNounsDiacritics);
    /// assert_eq!(c.classify("citoyen", "citoyenne"), CorrectionCategory::GrammaticalAgreement);
    /// assert_eq!(c.classify("affairement", "avortement"), CorrectionCategory::MisrecognizedVocabulary);
    /// ```
    pub fn classify(&self, incorrect: &str, correct: &str) -> CorrectionCategory {
        if self.has_legal_marker(incorrect) || self.has_legal_marker(correct) {
            CorrectionCategory::LegalTerms
        } else if fold(incorrect) == fold(correct) {
            CorrectionCategory::ProperNounsDiacritics
        } else if agreement_variants(incorrect, correct) {
            CorrectionCategory::GrammaticalAgreement
        } else {
            CorrectionCategory::MisrecognizedVocabulary
        }
    }

    fn has_legal_marker(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.legal_markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        let markers: Vec<String> = DEFAULT_LEGAL_MARKERS.iter().map(|m| m.to_string()).collect();
        Self::new(&markers)
    }
}

/// `true` when both sides have the same words up to gender/number endings.
fn agreement_variants(a: &str, b: &str) -> bool {
    let a: Vec<String> = fold(a).split_whitespace().map(agreement_stem).collect();
    let b: Vec<String> = fold(b).split_whitespace().map(agreement_stem).collect();
    !a.is_empty() && a == b
}

/// Strip up to two agreement endings (`réfugiées` → `refugie` → `refugi`).
fn agreement_stem(word: &str) -> String {
    let mut stem = word.to_string();
    for _ in 0..2 {
        let Some(next) = AGREEMENT_ENDINGS.iter().find_map(|(ending, base)| {
            stem.strip_suffix(ending)
                .filter(|rest| rest.chars().count() >= MIN_STEM_CHARS)
                .map(|rest| format!("{rest}{base}"))
        }) else {
            break;
        };
        stem = next;
    }
    stem
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
