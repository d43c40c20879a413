//! Whitespace tokenizer used by the learning aligner.
//!
//! Tokens keep internal punctuation (`97(1)`, `l'État`) but lose leading and
//! trailing sentence punctuation so that `"décision."` and `"décision"` align.

/// Characters trimmed from both ends of every token.
const EDGE_PUNCTUATION: &[char] = &[
    ',', '.', ';', ':', '!', '?', '"', '«', '»', '“', '”', '…', '\u{a0}',
];

/// A single token and the character offset where it starts in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
}

/// Split `text` on whitespace, trimming edge punctuation.
///
/// Tokens that are pure punctuation are dropped.
///
/// ```
/// use transcript_qa::text::tokenize;
///
/// let tokens: Vec<String> = tokenize("Selon le paragraphe 97(1), madame.")
///     .into_iter()
///     .map(|t| t.text)
///     .collect();
/// assert_eq!(tokens, ["Selon", "le", "paragraphe", "97(1)", "madame"]);
/// ```
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut char_offset = 0usize;
    let mut current = String::new();
    let mut current_start = 0usize;

    for c in text.chars() {
        if c.is_whitespace() {
            push_token(&mut tokens, &current, current_start);
            current.clear();
        } else {
            if current.is_empty() {
                current_start = char_offset;
            }
            current.push(c);
        }
        char_offset += 1;
    }
    push_token(&mut tokens, &current, current_start);

    tokens
}

fn push_token(tokens: &mut Vec<Token>, raw: &str, start: usize) {
    if raw.is_empty() {
        return;
    }
    let leading = raw
        .chars()
        .take_while(|c| EDGE_PUNCTUATION.contains(c))
        .count();
    let trimmed = raw.trim_matches(|c| EDGE_PUNCTUATION.contains(&c));
    if trimmed.is_empty() {
        return;
    }
    tokens.push(Token {
        text: trimmed.to_string(),
        offset: start + leading,
    });
}
