//! Shared text utilities: diacritic folding, matching normalization,
//! whole-word matching and tokenization.

pub mod fold;
pub mod matching;
pub mod tokens;

pub use fold::{
    capitalize_first, fold, is_word_char, normalize_for_matching, strip_diacritics, word_count,
};
pub use matching::{match_forms, whole_word_matches, would_match, MatchForm};
pub use tokens::{tokenize, Token};
