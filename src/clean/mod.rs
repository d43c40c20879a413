//! Pre-correction text cleaning.
//!
//! Removes what a transcriber would never type:
//!
//! | Step | Example |
//! |------|---------|
//! | Filler tics | `Alors, euh, je` → `Alors, je`; `ok` unless punctuated |
//! | Dictionary suppressions | literal strings listed in the dictionary |
//! | Immediate repetitions | `le le tribunal` → `le tribunal` |
//! | Whitespace | runs of spaces collapsed, lines trimmed |
//!
//! Repetitions of words whose doubling is grammatical (`nous nous`,
//! `vous vous`) are kept. Cleaning is idempotent: a second pass over its own
//! output changes nothing.

use log::{debug, info};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CleaningConfig;
use crate::text::is_word_char;

// ---------------------------------------------------------------------------
// CleanError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CleanError {
    /// A configured tic pattern is not a valid regex.
    #[error("invalid tic pattern {pattern:?}: {source}")]
    InvalidTicPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// ---------------------------------------------------------------------------
// CleanReport
// ---------------------------------------------------------------------------

/// Counts of what the cleaner removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    pub tics_removed: usize,
    pub suppressions_removed: usize,
    pub repetitions_collapsed: usize,
    pub chars_before: usize,
    pub chars_after: usize,
}

impl CleanReport {
    pub fn is_noop(&self) -> bool {
        self.tics_removed == 0 && self.suppressions_removed == 0 && self.repetitions_collapsed == 0
    }
}

// ---------------------------------------------------------------------------
// TextCleaner
// ---------------------------------------------------------------------------

/// A compiled tic pattern and the replacement that keeps its capture
/// groups (`${1}${2}…`, empty when it has none).
#[derive(Debug, Clone)]
struct TicRule {
    regex: Regex,
    keep: String,
}

impl TicRule {
    fn compile(pattern: &str) -> Result<Self, CleanError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| CleanError::InvalidTicPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        let keep = (1..regex.captures_len()).map(|i| format!("${{{i}}}")).collect();
        Ok(Self { regex, keep })
    }
}

/// Compiled cleaning rules.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    enabled: bool,
    tics: Vec<TicRule>,
    collapse_repetitions: bool,
    repetition_exceptions: Vec<String>,
}

impl TextCleaner {
    pub fn new(config: &CleaningConfig) -> Result<Self, CleanError> {
        let tics = config
            .tic_patterns
            .iter()
            .map(|p| TicRule::compile(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enabled: config.enabled,
            tics,
            collapse_repetitions: config.collapse_repetitions,
            repetition_exceptions: config
                .repetition_exceptions
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        })
    }

    /// Clean `text`, removing `suppressions` (literal strings) as well.
    ///
    /// ```
    /// use transcript_qa::clean::TextCleaner;
    /// use transcript_qa::config::CleaningConfig;
    ///
    /// let cleaner = TextCleaner::new(&CleaningConfig::default()).unwrap();
    /// let (text, report) = cleaner.clean("Alors, euh, le le tribunal  a   statué.", &[]);
    /// assert_eq!(text, "Alors, le tribunal a statué.");
    /// assert_eq!(report.tics_removed, 1);
    /// assert_eq!(report.repetitions_collapsed, 1);
    /// ```
    pub fn clean(&self, text: &str, suppressions: &[String]) -> (String, CleanReport) {
        let mut report = CleanReport {
            chars_before: text.chars().count(),
            ..Default::default()
        };

        if !self.enabled {
            report.chars_after = report.chars_before;
            return (text.to_string(), report);
        }

        let mut working = text.to_string();

        for tic in &self.tics {
            // Kept text can complete a new match (`ok ok alors`), so repeat
            // until the rule stops changing anything.
            loop {
                let hits = tic.regex.find_iter(&working).count();
                if hits == 0 {
                    break;
                }
                let next = tic.regex.replace_all(&working, tic.keep.as_str());
                if next.as_ref() == working.as_str() {
                    break;
                }
                report.tics_removed += hits;
                working = next.into_owned();
            }
        }

        for literal in suppressions.iter().filter(|s| !s.is_empty()) {
            let hits = working.matches(literal.as_str()).count();
            if hits > 0 {
                report.suppressions_removed += hits;
                working = working.replace(literal.as_str(), "");
            }
        }

        let lines: Vec<String> = working
            .lines()
            .map(|line| {
                let words: Vec<&str> = line.split_whitespace().collect();
                if self.collapse_repetitions {
                    let (kept, collapsed) = self.collapse(&words);
                    report.repetitions_collapsed += collapsed;
                    kept.join(" ")
                } else {
                    words.join(" ")
                }
            })
            .filter(|line| !line.is_empty())
            .collect();

        let cleaned = lines.join("\n");
        report.chars_after = cleaned.chars().count();

        if report.is_noop() {
            debug!("Cleaner: nothing to remove");
        } else {
            info!(
                "Cleaner: {} tics, {} suppressions, {} repetitions removed ({} → {} chars)",
                report.tics_removed,
                report.suppressions_removed,
                report.repetitions_collapsed,
                report.chars_before,
                report.chars_after
            );
        }
        (cleaned, report)
    }

    /// Drop a word that repeats the previous one (`le le` → `le`).
    ///
    /// The previous word must be a bare word; the repeat may carry trailing
    /// punctuation, which is kept (`le le,` → `le,`).
    fn collapse(&self, words: &[&str]) -> (Vec<String>, usize) {
        let mut out: Vec<String> = Vec::with_capacity(words.len());
        let mut collapsed = 0;

        for word in words {
            let core_len: usize = word
                .chars()
                .take_while(|c| is_word_char(*c))
                .map(char::len_utf8)
                .sum();
            let (core, rest) = word.split_at(core_len);

            let repeats_previous = out.last().is_some_and(|prev| {
                !core.is_empty()
                    && prev.chars().all(is_word_char)
                    && prev.to_lowercase() == core.to_lowercase()
                    && !rest.starts_with(is_word_char)
                    && !self.repetition_exceptions.contains(&core.to_lowercase())
            });

            if repeats_previous {
                if let Some(prev) = out.last_mut() {
                    prev.push_str(rest);
                }
                collapsed += 1;
            } else {
                out.push((*word).to_string());
            }
        }
        (out, collapsed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
