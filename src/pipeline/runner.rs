//! Document pipeline and batch runner.
//!
//! [`DocumentPipeline`] runs one document synchronously; [`BatchRunner`]
//! fans a batch out over tokio's blocking pool.
//!
//! # Document flow
//!
//! ```text
//! DocumentInput
//!   └─▶ resolve variant, assign speaker roles  [Input]
//!         └─▶ SectionExtractor::locate         [Extraction]  (variants that require it)
//!               ├─ NotFound   → BoundaryNotFound, document aborted
//!               └─ OutOfRange → QaWarning, continue
//!         └─▶ render_dialogue                  (`ROLE : ` on speaker changes)
//!         └─▶ TextCleaner::clean
//!         └─▶ CorrectionEngine::correct
//!         └─▶ QualityScorer::score
//! ```
//!
//! Only the bracketed steps can abort a document; see [`DocumentError`].
//!
//! Every document of a batch sees the dictionary snapshot taken when the
//! batch starts, even if a merge commits while it runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::clean::{CleanError, TextCleaner};
use crate::config::AppConfig;
use crate::correct::CorrectionEngine;
use crate::dictionary::{Dictionary, DictionaryStore};
use crate::extract::{ExtractError, SectionExtractor, SectionLookup, SectionVariant};
use crate::qa::{QaWarning, QualityScorer, ScoringInput};
use crate::transcript::{render_dialogue, SpeakerRoles};

use super::input::DocumentInput;
use super::state::{BatchSummary, DocumentFailure, DocumentResult, ProcessedDocument, Stage};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration problems found while building a pipeline, before any
/// document is read.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A variant's patterns could not be compiled.
    #[error("variant {variant:?}: {source}")]
    Extract {
        variant: String,
        #[source]
        source: ExtractError,
    },

    #[error(transparent)]
    Clean(#[from] CleanError),
}

/// Reasons a document is aborted. None of them is retried.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No start pattern matched. There is no fallback to the full stream.
    #[error("{case_id}: no section boundary found for variant {variant:?}")]
    BoundaryNotFound { case_id: String, variant: String },

    #[error("unknown document variant {0:?}")]
    UnknownVariant(String),

    #[error("{case_id}: transcript has no text")]
    EmptyTranscript { case_id: String },

    /// Internal / unexpected error (e.g. tokio join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl DocumentError {
    /// The stage the document was in when this error was raised.
    pub fn stage(&self) -> Stage {
        match self {
            DocumentError::UnknownVariant(_) | DocumentError::EmptyTranscript { .. } => Stage::Input,
            DocumentError::BoundaryNotFound { .. } => Stage::Extraction,
            DocumentError::Internal(_) => Stage::Runtime,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Everything compiled from the configuration, shared by all documents.
#[derive(Debug)]
struct Rules {
    variants: BTreeMap<String, SectionVariant>,
    extractors: BTreeMap<String, SectionExtractor>,
    cleaner: TextCleaner,
    scorer: QualityScorer,
}

impl Rules {
    fn compile(config: &AppConfig) -> Result<Self, PipelineError> {
        let mut extractors = BTreeMap::new();
        for (name, variant) in &config.extraction.variants {
            if !variant.requires_extraction {
                continue;
            }
            let extractor =
                SectionExtractor::from_variant(variant).map_err(|source| PipelineError::Extract {
                    variant: name.clone(),
                    source,
                })?;
            extractors.insert(name.clone(), extractor);
        }

        Ok(Self {
            variants: config.extraction.variants.clone(),
            extractors,
            cleaner: TextCleaner::new(&config.cleaning)?,
            scorer: QualityScorer::new(config.qa.clone()),
        })
    }
}

// ---------------------------------------------------------------------------
// DocumentPipeline
// ---------------------------------------------------------------------------

/// Runs extract → clean → correct → score for one document against a fixed
/// dictionary snapshot. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DocumentPipeline {
    rules: Arc<Rules>,
    engine: CorrectionEngine,
}

impl DocumentPipeline {
    /// Compile the configured rules.
    ///
    /// # Errors
    ///
    /// Invalid boundary or tic patterns in the configuration.
    pub fn new(config: &AppConfig, dictionary: Arc<Dictionary>) -> Result<Self, PipelineError> {
        Ok(Self {
            rules: Arc::new(Rules::compile(config)?),
            engine: CorrectionEngine::new(dictionary),
        })
    }

    /// Same rules, another dictionary snapshot.
    pub fn with_dictionary(&self, dictionary: Arc<Dictionary>) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            engine: CorrectionEngine::new(dictionary),
        }
    }

    pub fn dictionary_version(&self) -> u32 {
        self.engine.dictionary().version()
    }

    pub fn process(&self, input: &DocumentInput) -> Result<ProcessedDocument, DocumentError> {
        let variant = self
            .rules
            .variants
            .get(&input.variant)
            .ok_or_else(|| DocumentError::UnknownVariant(input.variant.clone()))?;

        // Roles are ranked over the whole hearing, even when only a section
        // is kept.
        let speakers = SpeakerRoles::assign(
            &input.utterances,
            &variant.speaker_roles,
            variant.other_speakers.as_deref(),
        );

        // 1. Extraction
        let mut warnings = Vec::new();
        let (body, extraction) = match self.rules.extractors.get(&input.variant) {
            Some(extractor) => match extractor.locate(&input.utterances) {
                SectionLookup::Found(section) => {
                    if section.is_out_of_range() {
                        warnings.push(QaWarning::OutOfRangeExtraction {
                            word_count: section.result.word_count,
                            min_words: variant.min_words,
                            max_words: variant.max_words,
                        });
                    }
                    let body = render_dialogue(section.utterances(&input.utterances), &speakers);
                    (body, Some(section.result))
                }
                SectionLookup::NotFound => {
                    return Err(DocumentError::BoundaryNotFound {
                        case_id: input.case_id.clone(),
                        variant: input.variant.clone(),
                    })
                }
            },
            None => (render_dialogue(&input.utterances, &speakers), None),
        };
        if body.trim().is_empty() {
            return Err(DocumentError::EmptyTranscript {
                case_id: input.case_id.clone(),
            });
        }

        // 2. Cleaning
        let (cleaned, cleaning) = self
            .rules
            .cleaner
            .clean(&body, self.engine.dictionary().suppressions());
        log::debug!(
            "pipeline: {} cleaned ({} tics, {} repetitions)",
            input.case_id,
            cleaning.tics_removed,
            cleaning.repetitions_collapsed
        );

        // 3. Correction
        let outcome = self.engine.correct(&cleaned, &input.expected_entities);

        // 4. Scoring
        let document = input.assemble(&outcome.text);
        let report = self.rules.scorer.score(ScoringInput {
            case_id: &input.case_id,
            variant_name: &input.variant,
            variant,
            original_text: &cleaned,
            outcome: &outcome,
            document: &document,
            extra_warnings: &warnings,
        });

        Ok(ProcessedDocument {
            case_id: input.case_id.clone(),
            variant: input.variant.clone(),
            extraction,
            cleaning,
            speakers: speakers.into_map(),
            corrected_text: outcome.text,
            report,
        })
    }

    /// [`process`](Self::process), folded into a [`DocumentResult`].
    pub fn run(&self, input: &DocumentInput) -> DocumentResult {
        match self.process(input) {
            Ok(doc) => DocumentResult::Processed(Box::new(doc)),
            Err(e) => {
                log::warn!("pipeline: {} failed at {}: {e}", input.case_id, e.stage().label());
                DocumentResult::Failed(DocumentFailure {
                    case_id: input.case_id.clone(),
                    stage: e.stage(),
                    error: e.to_string(),
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// BatchRunner
// ---------------------------------------------------------------------------

/// Processes many documents in parallel, isolating failures per document.
///
/// ```rust,no_run
/// use transcript_qa::config::{AppConfig, AppPaths};
/// use transcript_qa::dictionary::DictionaryStore;
/// use transcript_qa::pipeline::BatchRunner;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = AppConfig::load()?;
/// let paths = AppPaths::new();
/// let store = DictionaryStore::open(config.dictionary_path(&paths), config.backup_dir(&paths))?;
/// let runner = BatchRunner::new(&config)?;
/// let results = runner.run(&store, Vec::new()).await;
/// # Ok(())
/// # }
/// ```
pub struct BatchRunner {
    template: DocumentPipeline,
    max_parallel: usize,
}

impl BatchRunner {
    pub fn new(config: &AppConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            template: DocumentPipeline::new(config, Arc::new(Dictionary::new()))?,
            max_parallel: config.batch.max_parallel.max(1),
        })
    }

    /// Run `inputs` against the store's current snapshot.
    ///
    /// Results come back in input order, one per document.
    pub async fn run(&self, store: &DictionaryStore, inputs: Vec<DocumentInput>) -> Vec<DocumentResult> {
        self.run_with(store.snapshot(), inputs).await
    }

    /// Run `inputs` against an explicit dictionary snapshot.
    pub async fn run_with(
        &self,
        dictionary: Arc<Dictionary>,
        inputs: Vec<DocumentInput>,
    ) -> Vec<DocumentResult> {
        let pipeline = Arc::new(self.template.with_dictionary(dictionary));
        let permits = Arc::new(Semaphore::new(self.max_parallel));
        log::info!(
            "batch: {} documents, dictionary v{}, {} workers",
            inputs.len(),
            pipeline.dictionary_version(),
            self.max_parallel
        );

        let mut handles = Vec::with_capacity(inputs.len());
        for input in inputs {
            let case_id = input.case_id.clone();
            let pipeline = Arc::clone(&pipeline);
            let permits = Arc::clone(&permits);
            let handle = tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| DocumentError::Internal(e.to_string()))?;
                tokio::task::spawn_blocking(move || pipeline.run(&input))
                    .await
                    .map_err(|e| DocumentError::Internal(e.to_string()))
            });
            handles.push((case_id, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (case_id, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => runtime_failure(case_id, e.to_string()),
                Err(e) => runtime_failure(case_id, e.to_string()),
            };
            results.push(result);
        }

        let summary = BatchSummary::from_results(&results);
        log::info!(
            "batch: {} pass, {} conditional, {} fail, {} errors",
            summary.passed,
            summary.conditional,
            summary.failed_qa,
            summary.errors
        );
        results
    }
}

fn runtime_failure(case_id: String, error: String) -> DocumentResult {
    log::warn!("batch: worker for {case_id} failed: {error}");
    DocumentResult::Failed(DocumentFailure {
        case_id,
        stage: Stage::Runtime,
        error,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correct::{EntityRole, ExpectedEntity};
    use crate::dictionary::{CorrectionCategory, DictionaryEntry};
    use crate::extract::{ExtractionStatus, RPD_REASONS};
    use crate::qa::Verdict;
    use crate::transcript::Utterance;
    use tempfile::tempdir;

    fn dictionary() -> Arc<Dictionary> {
        Arc::new(
            Dictionary::from_entries([
                DictionaryEntry::new(CorrectionCategory::ProperNounsDiacritics, "Michoacan", "Michoacán"),
                DictionaryEntry::new(CorrectionCategory::LegalTerms, "article 87", "article 96"),
            ])
            .unwrap(),
        )
    }

    fn rpd_input(case_id: &str) -> DocumentInput {
        DocumentInput {
            case_id: case_id.into(),
            variant: RPD_REASONS.into(),
            utterances: [
                "Bonjour à tous.",
                "Voici les motifs de la décision.",
                "Le demandeur vient de Michoacan, euh, au Mexique.",
                "Merci pour votre témoignage.",
            ]
            .into_iter()
            .map(Utterance::new)
            .collect(),
            expected_entities: Vec::new(),
            header_block: Some("Dossier de la SPR / RPD File: MC3-16722\nTRANSCRIPTION DES Motifs".into()),
            certification_block: Some(
                "FIN DES MOTIFS\nJe déclare que cette transcription est exacte.".into(),
            ),
        }
    }

    fn pipeline() -> DocumentPipeline {
        DocumentPipeline::new(&AppConfig::default(), dictionary()).unwrap()
    }

    #[test]
    fn full_run_extracts_cleans_corrects_and_scores() {
        let doc = pipeline().process(&rpd_input("MC3-16722")).unwrap();

        let extraction = doc.extraction.unwrap();
        assert_eq!((extraction.start_index, extraction.end_index), (1, 2));
        assert_eq!(extraction.status, ExtractionStatus::OutOfRange);

        assert_eq!(doc.cleaning.tics_removed, 1);
        assert_eq!(
            doc.corrected_text,
            "Voici les motifs de la décision.\nLe demandeur vient de Michoacán, au Mexique."
        );

        let report = doc.report;
        assert_eq!(report.initial_quality_score, 99);
        assert_eq!(report.verdict, Verdict::Pass);
        assert_eq!(report.audit_trail.len(), 1);
        assert!(matches!(report.warnings[0], QaWarning::OutOfRangeExtraction { .. }));
    }

    #[test]
    fn missing_boundary_is_fatal() {
        let mut input = rpd_input("MC3-00001");
        input.utterances.remove(1);
        let err = pipeline().process(&input).unwrap_err();
        assert!(matches!(err, DocumentError::BoundaryNotFound { .. }));
        assert_eq!(err.stage(), Stage::Extraction);
    }

    #[test]
    fn full_stream_variant_skips_extraction() {
        let mut input = rpd_input("TB4-01234");
        input.variant = "rad_full".into();
        input.header_block = Some("Dossier de la SAR / RAD File: TB4-01234".into());
        let doc = pipeline().process(&input).unwrap();
        assert!(doc.extraction.is_none());
        assert!(doc.corrected_text.starts_with("Bonjour à tous."));
        assert!(doc.corrected_text.ends_with("Merci pour votre témoignage."));
    }

    #[test]
    fn speaker_turns_carry_tribunal_roles() {
        let mut input = rpd_input("TB4-01234");
        input.variant = "rad_full".into();
        input.header_block = Some("Dossier de la SAR / RAD File: TB4-01234".into());
        for (utterance, tag) in input.utterances.iter_mut().zip(["A", "A", "B", "A"]) {
            utterance.speaker_tag = Some(tag.into());
        }

        let doc = pipeline().process(&input).unwrap();
        assert_eq!(doc.speakers["A"], "COMMISSAIRE");
        assert_eq!(doc.speakers["B"], "DEMANDEUR D'ASILE");
        assert_eq!(
            doc.corrected_text,
            "COMMISSAIRE : Bonjour à tous.\n\
             Voici les motifs de la décision.\n\
             DEMANDEUR D'ASILE : Le demandeur vient de Michoacán, au Mexique.\n\
             COMMISSAIRE : Merci pour votre témoignage."
        );
        assert_eq!(doc.report.verdict, Verdict::Pass);
    }

    #[test]
    fn unknown_variant_and_empty_stream() {
        let mut input = rpd_input("x");
        input.variant = "nope".into();
        let err = pipeline().process(&input).unwrap_err();
        assert!(matches!(err, DocumentError::UnknownVariant(_)));
        assert_eq!(err.stage(), Stage::Input);

        let mut empty = rpd_input("y");
        empty.variant = "id_full".into();
        empty.utterances.clear();
        assert!(matches!(
            pipeline().process(&empty).unwrap_err(),
            DocumentError::EmptyTranscript { .. }
        ));
    }

    #[test]
    fn cross_validation_warning_reaches_the_report() {
        let mut input = rpd_input("MC3-16722");
        input.expected_entities = vec![
            ExpectedEntity::new(EntityRole::FileNumber, "MC3-16722"),
            ExpectedEntity::new(EntityRole::PresidingMember, "Me Lavoie"),
        ];
        let doc = pipeline().process(&input).unwrap();
        // The file number only appears in the header, not in the body.
        let mismatches = doc
            .report
            .warnings
            .iter()
            .filter(|w| matches!(w, QaWarning::CrossValidationMismatch { .. }))
            .count();
        assert_eq!(mismatches, 2);
        assert_eq!(doc.report.verdict, Verdict::Pass);
    }

    #[test]
    fn invalid_configured_pattern_is_rejected_up_front() {
        let mut config = AppConfig::default();
        if let Some(v) = config.extraction.variants.get_mut(RPD_REASONS) {
            v.start_patterns.push("(unclosed".into());
        }
        let err = DocumentPipeline::new(&config, dictionary()).unwrap_err();
        assert!(matches!(err, PipelineError::Extract { .. }));
    }

    #[tokio::test]
    async fn batch_isolates_failures_and_keeps_order() {
        let runner = BatchRunner::new(&AppConfig::default()).unwrap();
        let mut broken = rpd_input("MC3-00002");
        broken.utterances.truncate(1);

        let inputs = vec![rpd_input("MC3-00001"), broken, rpd_input("MC3-00003")];
        let results = runner.run_with(dictionary(), inputs).await;

        let ids: Vec<&str> = results.iter().map(DocumentResult::case_id).collect();
        assert_eq!(ids, vec!["MC3-00001", "MC3-00002", "MC3-00003"]);
        assert!(results[0].is_processed());
        assert!(!results[1].is_processed());
        assert!(results[2].is_processed());

        let summary = BatchSummary::from_results(&results);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.errors, 1);
    }

    #[tokio::test]
    async fn batch_uses_the_snapshot_current_at_start() {
        let dir = tempdir().expect("temp dir");
        let store = DictionaryStore::open(dir.path().join("d.json"), dir.path().join("bk")).unwrap();
        store
            .upsert_manual(DictionaryEntry::new(
                CorrectionCategory::ProperNounsDiacritics,
                "Michoacan",
                "Michoacán",
            ))
            .unwrap();

        let runner = BatchRunner::new(&AppConfig::default()).unwrap();
        let results = runner.run(&store, vec![rpd_input("MC3-16722")]).await;

        let DocumentResult::Processed(doc) = &results[0] else {
            panic!("expected a processed document");
        };
        assert_eq!(doc.report.dictionary_version, store.version());
        assert!(doc.corrected_text.contains("Michoacán"));
    }
}
