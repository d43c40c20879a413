//! Ratcliff/Obershelp string similarity.
//!
//! `ratio = 2·M / T` where `M` is the number of characters in matching
//! blocks (longest common substring, then recursively on both sides) and
//! `T` the total number of characters in both strings.

/// Similarity in `[0, 1]`. Two empty strings are identical (`1.0`).
///
/// ```
/// use transcript_qa::learn::similarity::ratio;
///
/// assert!((ratio("de", "des") - 0.8).abs() < 1e-9);
/// assert_eq!(ratio("abc", "abc"), 1.0);
/// assert_eq!(ratio("abc", "xyz"), 0.0);
/// ```
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_substring(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// `(start_in_a, start_in_b, length)` of the longest common substring,
/// earliest in `a` on ties.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let len = cur[j + 1];
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(x: f64, y: f64) -> bool {
        (x - y).abs() < 1e-3
    }

    #[test]
    fn restored_accent() {
        assert!(close(ratio("Michoacan", "Michoacán"), 16.0 / 18.0));
    }

    #[test]
    fn agreement_suffix() {
        assert!(close(ratio("citoyen", "citoyenne"), 0.875));
    }

    #[test]
    fn recurses_on_both_sides_of_the_longest_block() {
        // "paragraphe " (11) + "7" (1) = 12 matched chars out of 29
        assert!(close(ratio("paragraphe 87", "paragraphe 97(1)"), 24.0 / 29.0));
    }

    #[test]
    fn symmetric_on_simple_inputs() {
        assert!(close(ratio("affairement", "avortement"), ratio("avortement", "affairement")));
    }

    #[test]
    fn empty_against_non_empty() {
        assert_eq!(ratio("", "abc"), 0.0);
        assert_eq!(ratio("", ""), 1.0);
    }
}
