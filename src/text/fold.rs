//! Character-level normalization for French (and Spanish) transcript text.
//!
//! Three forms are used across the crate:
//!
//! | Function | Used by | Example |
//! |----------|---------|---------|
//! | [`normalize_for_matching`] | boundary patterns | `"Voici  les Motifs’"` → `"voici les motifs'"` |
//! | [`strip_diacritics`] | learning classifier | `"Michoacán"` → `"Michoacan"` |
//! | [`fold`] | learning classifier | `"ÉTAT"` → `"etat"` |

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lowercase `text`, fold typographic apostrophes to `'` and collapse every
/// whitespace run into a single space.
///
/// ```
/// use transcript_qa::text::normalize_for_matching;
///
/// assert_eq!(
///     normalize_for_matching("  J’ai rendu\n ma DÉCISION "),
///     "j'ai rendu ma décision"
/// );
/// ```
pub fn normalize_for_matching(text: &str) -> String {
    let lowered: String = text
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '\u{02BC}' => '\'',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace accented Latin letters by their unaccented base letter.
///
/// Ligatures expand (`œ` → `oe`), so the output may be longer than the input.
pub fn strip_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match base_letter(c) {
            Some(base) => out.push_str(base),
            None => out.push(c),
        }
    }
    out
}

/// Case- and diacritic-insensitive form: `strip_diacritics(lowercase(text))`.
pub fn fold(text: &str) -> String {
    strip_diacritics(&text.to_lowercase())
}

/// Uppercase the first character, leave the rest untouched.
///
/// ```
/// use transcript_qa::text::capitalize_first;
///
/// assert_eq!(capitalize_first("état"), "État");
/// assert_eq!(capitalize_first(""), "");
/// ```
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether `c` counts as part of a word for whole-word matching.
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn base_letter(c: char) -> Option<&'static str> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'ç' => "c",
        'Ç' => "C",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ñ' => "n",
        'Ñ' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "O",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'œ' => "oe",
        'Œ' => "OE",
        'æ' => "ae",
        'Æ' => "AE",
        _ => return None,
    };
    Some(base)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
