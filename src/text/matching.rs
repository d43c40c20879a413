//! Whole-word literal matching shared by the correction engine and the
//! dictionary's chain check.
//!
//! An entry `incorrect → correct` is searched in one or two forms (see
//! [`match_forms`]). An occurrence of a form counts when:
//!
//! - it is not glued to a word character on a side where the form itself
//!   starts or ends with one, and
//! - it does not sit inside an occurrence of the form's own replacement
//!   (`paragraphe 97` inside `paragraphe 97(1)`).

use super::fold::{capitalize_first, is_word_char};

/// One literal to search for and what replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchForm {
    pub find: String,
    pub replace: String,
}

/// The exact form, plus the sentence-initial form when `incorrect` starts in
/// lowercase. A capitalized form that would replace a word by itself is
/// left out.
///
/// ```
/// use transcript_qa::text::match_forms;
///
/// let forms = match_forms("en virtu", "en vertu");
/// assert_eq!(forms.len(), 2);
/// assert_eq!(forms[1].find, "En virtu");
/// assert_eq!(forms[1].replace, "En vertu");
///
/// // "Loi" → "Loi" would be a no-op.
/// assert_eq!(match_forms("loi", "Loi").len(), 1);
/// ```
pub fn match_forms(incorrect: &str, correct: &str) -> Vec<MatchForm> {
    let mut forms = vec![MatchForm {
        find: incorrect.to_string(),
        replace: correct.to_string(),
    }];
    if incorrect.chars().next().is_some_and(char::is_lowercase) {
        let find = capitalize_first(incorrect);
        let replace = capitalize_first(correct);
        if find != incorrect && find != replace {
            forms.push(MatchForm { find, replace });
        }
    }
    forms
}

/// Byte spans of every valid occurrence of `form.find` in `text`, in order.
///
/// Spans may overlap each other; callers that replace text pick a
/// non-overlapping subset.
pub fn whole_word_matches(text: &str, form: &MatchForm) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    if form.find.is_empty() {
        return spans;
    }
    let protected = occurrences(text, &form.replace);
    let check_left = form.find.chars().next().is_some_and(is_word_char);
    let check_right = form.find.chars().last().is_some_and(is_word_char);

    for (start, end) in occurrences(text, &form.find) {
        let left_ok = !check_left || !text[..start].chars().next_back().is_some_and(is_word_char);
        let right_ok = !check_right || !text[end..].chars().next().is_some_and(is_word_char);
        let inside_replace = protected.iter().any(|&(ps, pe)| ps <= start && end <= pe);
        if left_ok && right_ok && !inside_replace {
            spans.push((start, end));
        }
    }
    spans
}

/// Whether any form of `incorrect → correct` would fire somewhere in `text`.
pub fn would_match(text: &str, incorrect: &str, correct: &str) -> bool {
    match_forms(incorrect, correct)
        .iter()
        .any(|form| !whole_word_matches(text, form).is_empty())
}

/// Byte spans of every (possibly overlapping) occurrence of `needle`.
fn occurrences(text: &str, needle: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    if needle.is_empty() {
        return spans;
    }
    let mut from = 0usize;
    while let Some(offset) = text[from..].find(needle) {
        let start = from + offset;
        spans.push((start, start + needle.len()));
        from = start + text[start..].chars().next().map_or(1, char::len_utf8);
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(find: &str, replace: &str) -> MatchForm {
        MatchForm {
            find: find.into(),
            replace: replace.into(),
        }
    }

    #[test]
    fn respects_word_boundaries() {
        let spans = whole_word_matches("citoyen, citoyenne, concitoyen", &form("citoyen", "citoyenne"));
        assert_eq!(spans, vec![(0, 7)]);
    }

    #[test]
    fn punctuation_edges_are_not_checked() {
        let spans = whole_word_matches("art.97(1)", &form("97(1)", "97 (1)"));
        assert_eq!(spans, vec![(4, 9)]);
    }

    #[test]
    fn skips_occurrences_inside_replacement() {
        let f = form("paragraphe 97", "paragraphe 97(1)");
        let text = "paragraphe 97(1) et paragraphe 97";
        assert_eq!(whole_word_matches(text, &f), vec![(20, 33)]);
    }

    #[test]
    fn sentence_form_only_for_lowercase_entries() {
        assert_eq!(match_forms("Etat", "État").len(), 1);
        assert_eq!(match_forms("citoyen", "citoyenne").len(), 2);
    }

    #[test]
    fn would_match_sees_capitalized_form() {
        assert!(would_match("Citoyen mexicain", "citoyen", "citoyenne"));
        assert!(!would_match("la citoyenne", "citoyen", "citoyenne"));
        assert!(!would_match("la Loi sur", "loi", "Loi"));
        assert!(would_match("la Loi sur", "Loi", "loi"));
    }
}
