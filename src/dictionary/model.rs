//! In-memory dictionary model and its JSON persistence format.
//!
//! On disk a dictionary looks like:
//!
//! ```json
//! {
//!   "version": 4,
//!   "updated_at": "2026-01-07T14:02:11Z",
//!   "entry_count": 3,
//!   "categories": {
//!     "legal_terms": { "article 87": { "correct": "article 96", "added_on": "2026-01-07", "source_case_id": "MC3-16722" } },
//!     "proper_nouns_diacritics": { "Michoacan": "Michoacán" },
//!     "grammatical_agreement": {},
//!     "misrecognized_vocabulary": { "affairement": "avortement" }
//!   },
//!   "suppressions": []
//! }
//! ```
//!
//! Values may be a bare `correct` string (hand-written files) or a record
//! with provenance. Files using the older `pass1_termes_juridiques` …
//! `pass4_mots_mal_reconnus` top-level keys and a dotted string version
//! (`"2.1"`) load as well; they are always written back in the current form.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::text::would_match;

use super::category::CorrectionCategory;
use super::DictionaryError;

// ---------------------------------------------------------------------------
// TermRecord / DictionaryEntry
// ---------------------------------------------------------------------------

/// Value side of a dictionary mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub correct: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_case_id: Option<String>,
}

/// A full dictionary entry: one `incorrect → correct` mapping in a category.
///
/// Provenance is optional because hand-maintained dictionaries carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub incorrect: String,
    pub correct: String,
    pub category: CorrectionCategory,
    pub added_on: Option<NaiveDate>,
    pub source_case_id: Option<String>,
}

impl DictionaryEntry {
    pub fn new(
        category: CorrectionCategory,
        incorrect: impl Into<String>,
        correct: impl Into<String>,
    ) -> Self {
        Self {
            incorrect: incorrect.into(),
            correct: correct.into(),
            category,
            added_on: None,
            source_case_id: None,
        }
    }

    /// Attach provenance (date added and the case it was learned from).
    pub fn with_provenance(mut self, added_on: NaiveDate, source_case_id: impl Into<String>) -> Self {
        self.added_on = Some(added_on);
        self.source_case_id = Some(source_case_id.into());
        self
    }

    fn record(&self) -> TermRecord {
        TermRecord {
            correct: self.correct.clone(),
            added_on: self.added_on,
            source_case_id: self.source_case_id.clone(),
        }
    }
}

/// Result of an automated (non-overwriting) insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The entry was new and has been added.
    Added,
    /// The exact same mapping already exists.
    AlreadyPresent,
    /// The key exists with a different correction; nothing was changed.
    Conflicting { existing: String },
}

// ---------------------------------------------------------------------------
// Dictionary
// ---------------------------------------------------------------------------

/// Versioned `incorrect → correct` mappings partitioned by category.
///
/// The dictionary itself is a plain value. Sharing and mutation discipline
/// live in [`DictionaryStore`](super::DictionaryStore).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    version: u32,
    updated_at: Option<DateTime<Utc>>,
    terms: BTreeMap<CorrectionCategory, BTreeMap<String, TermRecord>>,
    suppressions: Vec<String>,
}

impl Dictionary {
    /// Empty dictionary at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from entries (tests, seeding). Entries go through
    /// the same validation as manual edits.
    pub fn from_entries(
        entries: impl IntoIterator<Item = DictionaryEntry>,
    ) -> Result<Self, DictionaryError> {
        let mut dict = Self::new();
        for entry in entries {
            dict.upsert(entry)?;
        }
        Ok(dict)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Total number of mappings across all categories.
    pub fn entry_count(&self) -> usize {
        self.terms.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Mappings of one category, in key order.
    pub fn terms(&self, category: CorrectionCategory) -> impl Iterator<Item = (&str, &TermRecord)> {
        self.terms
            .get(&category)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn category_len(&self, category: CorrectionCategory) -> usize {
        self.terms.get(&category).map_or(0, BTreeMap::len)
    }

    pub fn get(&self, category: CorrectionCategory, incorrect: &str) -> Option<&TermRecord> {
        self.terms.get(&category).and_then(|m| m.get(incorrect))
    }

    pub fn contains(&self, category: CorrectionCategory, incorrect: &str) -> bool {
        self.get(category, incorrect).is_some()
    }

    /// Literal strings removed by the text cleaner.
    pub fn suppressions(&self) -> &[String] {
        &self.suppressions
    }

    /// All entries, in canonical category order then key order.
    pub fn entries(&self) -> Vec<DictionaryEntry> {
        self.terms
            .iter()
            .flat_map(|(category, map)| {
                map.iter().map(move |(incorrect, record)| DictionaryEntry {
                    incorrect: incorrect.clone(),
                    correct: record.correct.clone(),
                    category: *category,
                    added_on: record.added_on,
                    source_case_id: record.source_case_id.clone(),
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Manual edit: insert or overwrite (last write wins).
    ///
    /// Returns the previous record when one was replaced.
    pub fn upsert(&mut self, entry: DictionaryEntry) -> Result<Option<TermRecord>, DictionaryError> {
        self.validate(&entry)?;
        let record = entry.record();
        Ok(self
            .terms
            .entry(entry.category)
            .or_default()
            .insert(entry.incorrect, record))
    }

    /// Automated insertion: never overwrites an existing key.
    pub fn insert_new(&mut self, entry: DictionaryEntry) -> Result<InsertOutcome, DictionaryError> {
        if let Some(existing) = self.get(entry.category, &entry.incorrect) {
            if existing.correct == entry.correct {
                return Ok(InsertOutcome::AlreadyPresent);
            }
            return Ok(InsertOutcome::Conflicting {
                existing: existing.correct.clone(),
            });
        }
        self.validate(&entry)?;
        let record = entry.record();
        self.terms
            .entry(entry.category)
            .or_default()
            .insert(entry.incorrect, record);
        Ok(InsertOutcome::Added)
    }

    /// Remove a mapping (manual edit).
    pub fn remove(&mut self, category: CorrectionCategory, incorrect: &str) -> Option<TermRecord> {
        self.terms.get_mut(&category).and_then(|m| m.remove(incorrect))
    }

    pub fn add_suppression(&mut self, literal: impl Into<String>) {
        let literal = literal.into();
        if !literal.is_empty() && !self.suppressions.contains(&literal) {
            self.suppressions.push(literal);
        }
    }

    pub(crate) fn set_version(&mut self, version: u32, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = Some(at);
    }

    /// Reject entries that would break correction idempotence: empty sides,
    /// identity mappings, and chains where one entry's `correct` contains
    /// another entry's `incorrect` as a whole word (either way round).
    ///
    /// Containment uses the engine's own matching rule, so an entry is
    /// rejected exactly when the engine could rewrite another entry's output.
    fn validate(&self, entry: &DictionaryEntry) -> Result<(), DictionaryError> {
        if entry.incorrect.trim().is_empty() || entry.correct.trim().is_empty() {
            return Err(DictionaryError::InvalidEntry(format!(
                "empty term in {} entry {:?} → {:?}",
                entry.category, entry.incorrect, entry.correct
            )));
        }
        if entry.incorrect == entry.correct {
            return Err(DictionaryError::InvalidEntry(format!(
                "{} entry {:?} maps onto itself",
                entry.category, entry.incorrect
            )));
        }

        for (category, map) in &self.terms {
            for (incorrect, record) in map {
                if *category == entry.category && *incorrect == entry.incorrect {
                    continue;
                }
                let feeds_other = would_match(&entry.correct, incorrect, &record.correct);
                let fed_by_other = would_match(&record.correct, &entry.incorrect, &entry.correct);
                if feeds_other || fed_by_other {
                    return Err(DictionaryError::ChainedEntry {
                        incorrect: entry.incorrect.clone(),
                        correct: entry.correct.clone(),
                        other: format!("{category}: {incorrect:?} → {:?}", record.correct),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run [`validate`](Self::validate) on every entry against the rest.
    fn check_entries(&self) -> Result<(), DictionaryError> {
        for entry in self.entries() {
            self.validate(&entry)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence format
    // -----------------------------------------------------------------------

    /// Parse the JSON persistence format (current or legacy layout).
    ///
    /// Loaded entries are held to the same rules as edits: a file with an
    /// identity mapping or a chained pair fails with
    /// [`DictionaryError::InvalidEntry`] or [`DictionaryError::ChainedEntry`].
    pub fn from_json_str(data: &str) -> Result<Self, DictionaryError> {
        let file: DictionaryFile = serde_json::from_str(data)?;
        let dictionary = file.into_dictionary();
        dictionary.check_entries()?;
        Ok(dictionary)
    }

    /// Serialize to the current JSON layout.
    pub fn to_json_pretty(&self) -> Result<String, DictionaryError> {
        let file = DictionaryFile::from_dictionary(self);
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Read only the version field of a persisted dictionary.
    pub(crate) fn version_of_json(data: &[u8]) -> Result<u32, DictionaryError> {
        let header: VersionHeader = serde_json::from_slice(data)?;
        Ok(header.version.as_number())
    }
}

// ---------------------------------------------------------------------------
// On-disk layout (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredTerm {
    Plain(String),
    Detailed(TermRecord),
}

impl StoredTerm {
    fn into_record(self) -> TermRecord {
        match self {
            StoredTerm::Plain(correct) => TermRecord {
                correct,
                added_on: None,
                source_case_id: None,
            },
            StoredTerm::Detailed(record) => record,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum VersionField {
    Number(u32),
    Text(String),
}

impl VersionField {
    /// Dotted legacy versions keep their major number (`"2.1"` → 2).
    fn as_number(&self) -> u32 {
        match self {
            VersionField::Number(n) => *n,
            VersionField::Text(s) => s
                .split('.')
                .next()
                .and_then(|major| major.trim().parse().ok())
                .unwrap_or(0),
        }
    }
}

impl Default for VersionField {
    fn default() -> Self {
        VersionField::Number(0)
    }
}

#[derive(Debug, Deserialize)]
struct VersionHeader {
    #[serde(default)]
    version: VersionField,
}

type TermMap = BTreeMap<String, StoredTerm>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CategoriesFile {
    #[serde(default)]
    legal_terms: TermMap,
    #[serde(default)]
    proper_nouns_diacritics: TermMap,
    #[serde(default)]
    grammatical_agreement: TermMap,
    #[serde(default)]
    misrecognized_vocabulary: TermMap,
}

impl CategoriesFile {
    fn slot(&mut self, category: CorrectionCategory) -> &mut TermMap {
        match category {
            CorrectionCategory::LegalTerms => &mut self.legal_terms,
            CorrectionCategory::ProperNounsDiacritics => &mut self.proper_nouns_diacritics,
            CorrectionCategory::GrammaticalAgreement => &mut self.grammatical_agreement,
            CorrectionCategory::MisrecognizedVocabulary => &mut self.misrecognized_vocabulary,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    version: VersionField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entry_count: usize,
    #[serde(default)]
    categories: CategoriesFile,
    #[serde(default)]
    suppressions: Vec<String>,

    #[serde(default, rename = "pass1_termes_juridiques", skip_serializing)]
    legacy_legal_terms: TermMap,
    #[serde(default, rename = "pass2_noms_propres_accents", skip_serializing)]
    legacy_proper_nouns: TermMap,
    #[serde(default, rename = "pass3_accords_grammaticaux", skip_serializing)]
    legacy_agreement: TermMap,
    #[serde(default, rename = "pass4_mots_mal_reconnus", skip_serializing)]
    legacy_vocabulary: TermMap,
}

impl DictionaryFile {
    fn into_dictionary(mut self) -> Dictionary {
        let legacy = [
            (CorrectionCategory::LegalTerms, std::mem::take(&mut self.legacy_legal_terms)),
            (CorrectionCategory::ProperNounsDiacritics, std::mem::take(&mut self.legacy_proper_nouns)),
            (CorrectionCategory::GrammaticalAgreement, std::mem::take(&mut self.legacy_agreement)),
            (CorrectionCategory::MisrecognizedVocabulary, std::mem::take(&mut self.legacy_vocabulary)),
        ];

        let mut terms = BTreeMap::new();
        for (category, legacy_map) in legacy {
            let mut map: BTreeMap<String, TermRecord> = std::mem::take(self.categories.slot(category))
                .into_iter()
                .map(|(k, v)| (k, v.into_record()))
                .collect();
            for (k, v) in legacy_map {
                map.entry(k).or_insert_with(|| v.into_record());
            }
            if !map.is_empty() {
                terms.insert(category, map);
            }
        }

        Dictionary {
            version: self.version.as_number(),
            updated_at: self.updated_at,
            terms,
            suppressions: self.suppressions,
        }
    }

    fn from_dictionary(dict: &Dictionary) -> Self {
        let mut categories = CategoriesFile::default();
        for (category, map) in &dict.terms {
            let slot = categories.slot(*category);
            for (k, v) in map {
                slot.insert(k.clone(), StoredTerm::Detailed(v.clone()));
            }
        }
        Self {
            version: VersionField::Number(dict.version),
            updated_at: dict.updated_at,
            entry_count: dict.entry_count(),
            categories,
            suppressions: dict.suppressions.clone(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use CorrectionCategory::*;

    fn sample() -> Dictionary {
        Dictionary::from_entries([
            DictionaryEntry::new(LegalTerms, "article 87", "article 96"),
            DictionaryEntry::new(LegalTerms, "en virtu", "en vertu"),
            DictionaryEntry::new(ProperNounsDiacritics, "Michoacan", "Michoacán"),
            DictionaryEntry::new(GrammaticalAgreement, "citoyen", "citoyenne"),
            DictionaryEntry::new(MisrecognizedVocabulary, "affairement", "avortement"),
        ])
        .unwrap()
    }

    #[test]
    fn counts_entries_per_category() {
        let dict = sample();
        assert_eq!(dict.entry_count(), 5);
        assert_eq!(dict.category_len(LegalTerms), 2);
        assert_eq!(dict.category_len(GrammaticalAgreement), 1);
        assert!(dict.contains(ProperNounsDiacritics, "Michoacan"));
        assert!(!dict.contains(LegalTerms, "Michoacan"));
    }

    #[test]
    fn upsert_is_last_write_wins() {
        let mut dict = sample();
        let previous = dict
            .upsert(DictionaryEntry::new(LegalTerms, "article 87", "article 97"))
            .unwrap();
        assert_eq!(previous.unwrap().correct, "article 96");
        assert_eq!(dict.get(LegalTerms, "article 87").unwrap().correct, "article 97");
        assert_eq!(dict.entry_count(), 5);
    }

    #[test]
    fn insert_new_never_overwrites() {
        let mut dict = sample();
        let outcome = dict
            .insert_new(DictionaryEntry::new(LegalTerms, "article 87", "article 97"))
            .unwrap();
        assert_eq!(
            outcome,
            InsertOutcome::Conflicting {
                existing: "article 96".into()
            }
        );
        assert_eq!(dict.get(LegalTerms, "article 87").unwrap().correct, "article 96");

        let again = dict
            .insert_new(DictionaryEntry::new(LegalTerms, "article 87", "article 96"))
            .unwrap();
        assert_eq!(again, InsertOutcome::AlreadyPresent);
    }

    #[test]
    fn same_key_allowed_in_other_category() {
        let mut dict = sample();
        let outcome = dict
            .insert_new(DictionaryEntry::new(MisrecognizedVocabulary, "citoyen", "citoyens"))
            .unwrap();
        assert_eq!(outcome, InsertOutcome::Added);
    }

    #[test]
    fn rejects_identity_mapping() {
        let mut dict = Dictionary::new();
        let err = dict
            .upsert(DictionaryEntry::new(LegalTerms, "LIPR", "LIPR"))
            .unwrap_err();
        assert!(matches!(err, DictionaryError::InvalidEntry(_)), "{err}");
    }

    #[test]
    fn rejects_empty_terms() {
        let mut dict = Dictionary::new();
        assert!(dict.upsert(DictionaryEntry::new(LegalTerms, "  ", "x")).is_err());
    }

    #[test]
    fn rejects_chains_in_both_directions() {
        let mut dict = sample();
        // output of the new entry is the input of an existing one
        let err = dict
            .insert_new(DictionaryEntry::new(MisrecognizedVocabulary, "citoyin", "citoyen"))
            .unwrap_err();
        assert!(matches!(err, DictionaryError::ChainedEntry { .. }), "{err}");

        // input of the new entry is the output of an existing one
        let err = dict
            .insert_new(DictionaryEntry::new(MisrecognizedVocabulary, "avortement", "avortements"))
            .unwrap_err();
        assert!(matches!(err, DictionaryError::ChainedEntry { .. }), "{err}");
    }

    #[test]
    fn rejects_chains_through_a_contained_word() {
        let mut dict = Dictionary::new();
        dict.upsert(DictionaryEntry::new(LegalTerms, "la loi sur", "la Loi sur"))
            .unwrap();
        let err = dict
            .upsert(DictionaryEntry::new(MisrecognizedVocabulary, "Loi", "loi"))
            .unwrap_err();
        assert!(matches!(err, DictionaryError::ChainedEntry { .. }), "{err}");

        let err = dict
            .upsert(DictionaryEntry::new(GrammaticalAgreement, "réfugié", "réfugiés"))
            .and_then(|_| dict.upsert(DictionaryEntry::new(LegalTerms, "LIPR", "loi pour le réfugié")))
            .unwrap_err();
        assert!(matches!(err, DictionaryError::ChainedEntry { .. }), "{err}");
    }

    #[test]
    fn containment_inside_a_longer_word_is_not_a_chain() {
        let dict = Dictionary::from_entries([
            DictionaryEntry::new(GrammaticalAgreement, "citoyen", "citoyenne"),
            DictionaryEntry::new(LegalTerms, "concitoyen", "concitoyens"),
            DictionaryEntry::new(LegalTerms, "loi sur l'immigration", "Loi sur l'immigration"),
            DictionaryEntry::new(LegalTerms, "loi", "Loi"),
        ]);
        assert!(dict.is_ok(), "{:?}", dict.err());
    }

    #[test]
    fn loading_rejects_chained_file() {
        let chained = r#"{
            "pass1_termes_juridiques": { "LIPR": "LPR" },
            "pass4_mots_mal_reconnus": { "LPR": "LIPR" }
        }"#;
        let err = Dictionary::from_json_str(chained).unwrap_err();
        assert!(matches!(err, DictionaryError::ChainedEntry { .. }), "{err}");
    }

    #[test]
    fn loading_rejects_identity_entry() {
        let identity = r#"{ "categories": { "legal_terms": { "LIPR": "LIPR" } } }"#;
        let err = Dictionary::from_json_str(identity).unwrap_err();
        assert!(matches!(err, DictionaryError::InvalidEntry(_)), "{err}");
    }

    #[test]
    fn json_round_trip_keeps_provenance() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        let mut dict = sample();
        dict.upsert(DictionaryEntry::new(LegalTerms, "LIPRE", "LIPR").with_provenance(date, "MC3-16722"))
            .unwrap();
        dict.add_suppression("[inaudible]");

        let json = dict.to_json_pretty().unwrap();
        let loaded = Dictionary::from_json_str(&json).unwrap();
        assert_eq!(loaded, dict);

        let record = loaded.get(LegalTerms, "LIPRE").unwrap();
        assert_eq!(record.added_on, Some(date));
        assert_eq!(record.source_case_id.as_deref(), Some("MC3-16722"));
    }

    #[test]
    fn serialized_form_reports_entry_count() {
        let json = sample().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entry_count"], 5);
        assert_eq!(value["categories"]["legal_terms"]["en virtu"]["correct"], "en vertu");
    }

    #[test]
    fn loads_legacy_layout() {
        let legacy = r#"{
            "version": "2.1",
            "pass1_termes_juridiques": { "article 87": "article 96", "en virtu": "en vertu" },
            "pass2_noms_propres_accents": { "Etat": "État" },
            "pass3_accords_grammaticaux": { "citoyen": "citoyenne" },
            "pass4_mots_mal_reconnus": { "affairement": "avortement" },
            "suppressions": []
        }"#;
        let dict = Dictionary::from_json_str(legacy).unwrap();
        assert_eq!(dict.version(), 2);
        assert_eq!(dict.entry_count(), 5);
        assert_eq!(dict.get(ProperNounsDiacritics, "Etat").unwrap().correct, "État");
        assert!(dict.get(LegalTerms, "article 87").unwrap().added_on.is_none());
    }

    #[test]
    fn reads_version_header_only() {
        let json = sample().to_json_pretty().unwrap();
        assert_eq!(Dictionary::version_of_json(json.as_bytes()).unwrap(), 0);
        assert_eq!(Dictionary::version_of_json(br#"{"version": 7}"#).unwrap(), 7);
    }

    #[test]
    fn entries_follow_canonical_order() {
        let cats: Vec<_> = sample().entries().into_iter().map(|e| e.category).collect();
        let mut sorted = cats.clone();
        sorted.sort();
        assert_eq!(cats, sorted);
    }
}
