//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`: a `settings.toml` only needs the
//! keys it changes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::extract::{default_variants, SectionVariant};
use crate::learn::{DEFAULT_ANCHOR_TOKENS, DEFAULT_BLACKLIST, DEFAULT_LEGAL_MARKERS};

use super::AppPaths;

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

// ---------------------------------------------------------------------------
// DictionaryConfig
// ---------------------------------------------------------------------------

/// Where the dictionary lives. `None` means the platform default from
/// [`AppPaths`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    pub path: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// ExtractionConfig
// ---------------------------------------------------------------------------

/// Document variants, keyed by the name callers pass in `DocumentInput`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub variants: BTreeMap<String, SectionVariant>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
        }
    }
}

// ---------------------------------------------------------------------------
// CleaningConfig
// ---------------------------------------------------------------------------

/// Settings for the pre-correction text cleaner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Skip cleaning entirely when `false`.
    pub enabled: bool,
    /// Filler tics, as case-insensitive regexes. Each match is deleted
    /// except for the text of its capture groups, which stays in place; use
    /// `(?:…)` for plain grouping.
    pub tic_patterns: Vec<String>,
    /// Collapse `le le` → `le`.
    pub collapse_repetitions: bool,
    /// Words whose doubling is grammatical and must be kept.
    pub repetition_exceptions: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tic_patterns: vec![
                r"\beuh\b,?".into(),
                r"\bhmm?\b,?".into(),
                r"\bben\s*,".into(),
                // `ok` stays when punctuation follows it.
                r"\bok\b(\s*(?:[^\s,.]|$))".into(),
            ],
            collapse_repetitions: true,
            repetition_exceptions: owned(&["nous", "vous"]),
        }
    }
}

// ---------------------------------------------------------------------------
// LearningConfig
// ---------------------------------------------------------------------------

/// Settings for the learning proposer's filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Minimum Ratcliff/Obershelp ratio for a candidate (0.0 – 1.0).
    pub similarity_threshold: f64,
    /// Both sides of a candidate must have at least this many characters.
    pub min_token_chars: usize,
    /// Tokens of reference context kept on each side of a proposal.
    pub context_window: usize,
    /// Replace hunks longer than this (either side, in tokens) are not
    /// candidates.
    pub max_hunk_tokens: usize,
    /// Below this share of common tokens the reference is treated as
    /// unrelated to the transcript.
    pub min_alignment: f64,
    /// Function words never learned.
    pub blacklist: Vec<String>,
    /// Substrings that classify a pair as a legal term.
    pub legal_markers: Vec<String>,
    /// Tokens prepended to a bare number (`article 87`).
    pub anchor_tokens: Vec<String>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            min_token_chars: 3,
            context_window: 5,
            max_hunk_tokens: 4,
            min_alignment: 0.3,
            blacklist: owned(DEFAULT_BLACKLIST),
            legal_markers: owned(DEFAULT_LEGAL_MARKERS),
            anchor_tokens: owned(DEFAULT_ANCHOR_TOKENS),
        }
    }
}

// ---------------------------------------------------------------------------
// QaConfig
// ---------------------------------------------------------------------------

/// Score bands and structural markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Score at or above which a document passes (and is `Excellent`).
    pub pass_threshold: u32,
    /// Score at or above which a document passes conditionally (`Good`).
    pub conditional_threshold: u32,
    /// Lower bound of the `Fair` level.
    pub fair_threshold: u32,
    /// More critical corrections than this add a review recommendation.
    pub critical_review_threshold: usize,
    /// Header markers common to every variant.
    pub header_markers: Vec<String>,
    /// Catastrophic mistranscriptions; any occurrence fails the document.
    pub zero_tolerance_terms: Vec<String>,
    pub certification_marker: String,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 85,
            conditional_threshold: 70,
            fair_threshold: 50,
            critical_review_threshold: 10,
            header_markers: owned(&["Dossier de la"]),
            zero_tolerance_terms: owned(&["FESPOLA", "CISSPOLA", "fiscalat"]),
            certification_marker: "déclare que cette transcription est exacte".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// BatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Documents processed at the same time on the blocking pool.
    pub max_parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_parallel: 4 }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use transcript_qa::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dictionary: DictionaryConfig,
    pub extraction: ExtractionConfig,
    pub cleaning: CleaningConfig,
    pub learning: LearningConfig,
    pub qa: QaConfig,
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet,
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Dictionary file, falling back to the platform default.
    pub fn dictionary_path(&self, paths: &AppPaths) -> PathBuf {
        self.dictionary
            .path
            .clone()
            .unwrap_or_else(|| paths.dictionary_file.clone())
    }

    /// Backup directory, falling back to the platform default.
    pub fn backup_dir(&self, paths: &AppPaths) -> PathBuf {
        self.dictionary
            .backup_dir
            .clone()
            .unwrap_or_else(|| paths.backups_dir.clone())
    }

    pub fn variant(&self, name: &str) -> Option<&SectionVariant> {
        self.extraction.variants.get(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RPD_REASONS;
    use tempfile::tempdir;

    /// A default `AppConfig` survives a TOML round trip.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        // Extraction
        assert_eq!(original.extraction.variants, loaded.extraction.variants);

        // Cleaning
        assert_eq!(original.cleaning.tic_patterns, loaded.cleaning.tic_patterns);
        assert_eq!(
            original.cleaning.repetition_exceptions,
            loaded.cleaning.repetition_exceptions
        );

        // Learning
        assert_eq!(
            original.learning.similarity_threshold,
            loaded.learning.similarity_threshold
        );
        assert_eq!(original.learning.blacklist, loaded.learning.blacklist);
        assert_eq!(original.learning.anchor_tokens, loaded.learning.anchor_tokens);

        // QA
        assert_eq!(original.qa.pass_threshold, loaded.qa.pass_threshold);
        assert_eq!(
            original.qa.zero_tolerance_terms,
            loaded.qa.zero_tolerance_terms
        );
        assert_eq!(
            original.qa.certification_marker,
            loaded.qa.certification_marker
        );

        // Batch
        assert_eq!(original.batch.max_parallel, loaded.batch.max_parallel);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert!(config.dictionary.path.is_none());
        assert_eq!(config.qa.conditional_threshold, 70);
        assert!(config.variant(RPD_REASONS).is_some());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.learning.similarity_threshold, 0.85);
        assert_eq!(cfg.learning.min_token_chars, 3);
        assert_eq!(cfg.learning.context_window, 5);
        assert_eq!(cfg.qa.pass_threshold, 85);
        assert_eq!(cfg.qa.conditional_threshold, 70);
        assert_eq!(cfg.qa.fair_threshold, 50);
        assert!(cfg.cleaning.enabled);
        assert_eq!(cfg.batch.max_parallel, 4);

        let rpd = cfg.variant(RPD_REASONS).unwrap();
        assert!(rpd.requires_extraction);
        assert_eq!(rpd.min_words, Some(1500));
        assert_eq!(rpd.max_words, Some(3000));
    }

    /// A partial file only overrides the keys it names.
    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[qa]\npass_threshold = 90\n\n[dictionary]\npath = \"/srv/qa/dictionary.json\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.qa.pass_threshold, 90);
        assert_eq!(cfg.qa.conditional_threshold, 70);
        assert_eq!(
            cfg.dictionary_path(&AppPaths::new()),
            PathBuf::from("/srv/qa/dictionary.json")
        );
        assert_eq!(cfg.backup_dir(&AppPaths::new()), AppPaths::new().backups_dir);
        assert!(cfg.variant(RPD_REASONS).is_some());
    }

    /// Modified values, including a custom variant, survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.learning.similarity_threshold = 0.9;
        cfg.qa.zero_tolerance_terms.push("TERMOLOGIE".into());
        cfg.cleaning.enabled = false;
        cfg.extraction.variants.insert(
            "custom".into(),
            SectionVariant {
                requires_extraction: true,
                start_patterns: vec![r"^décision".into()],
                end_patterns: Vec::new(),
                min_words: Some(10),
                max_words: None,
                document_title: None,
                header_markers: Vec::new(),
                closing_marker: None,
                speaker_roles: vec!["COMMISSAIRE".into()],
                other_speakers: None,
            },
        );

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.learning.similarity_threshold, 0.9);
        assert_eq!(loaded.qa.zero_tolerance_terms.len(), 4);
        assert!(!loaded.cleaning.enabled);
        let custom = loaded.variant("custom").unwrap();
        assert_eq!(custom.min_words, Some(10));
        assert_eq!(custom.max_words, None);
        assert_eq!(custom.start_patterns, vec![r"^décision".to_string()]);
        assert_eq!(custom.speaker_roles, vec!["COMMISSAIRE".to_string()]);
    }
}
