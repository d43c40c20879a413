//! Merging reviewed proposals into the dictionary.

use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use crate::dictionary::{
    CommitOutcome, DictionaryEntry, DictionaryError, DictionaryStore, InsertOutcome,
};

use super::proposer::{LearningProposal, ProposalStatus};

/// An accepted proposal whose key already maps to something else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeConflict {
    pub incorrect: String,
    pub proposed: String,
    pub existing: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: usize,
    pub already_present: usize,
    pub conflicts: Vec<MergeConflict>,
    /// Accepted proposals the dictionary refused (identity or chain).
    pub invalid: Vec<String>,
    /// Present when something was written.
    #[serde(skip)]
    pub commit: Option<CommitOutcome>,
}

/// Append every `Accepted` proposal to the dictionary.
///
/// Pending and rejected proposals are ignored. Existing keys are never
/// overwritten; a differing correction is reported as a conflict. Nothing
/// is written (and no backup taken) when no entry is actually added.
///
/// # Errors
///
/// Store errors ([`DictionaryError::WriteConflict`], I/O, backup) abort the
/// whole merge. Invalid individual entries do not.
pub fn merge_accepted(
    store: &DictionaryStore,
    proposals: &[LearningProposal],
    today: NaiveDate,
) -> Result<MergeReport, DictionaryError> {
    let accepted: Vec<&LearningProposal> = proposals
        .iter()
        .filter(|p| p.status == ProposalStatus::Accepted)
        .collect();

    let mut report = MergeReport::default();
    if accepted.is_empty() {
        info!("Merge: no accepted proposals");
        return Ok(report);
    }

    let mut writer = store.begin_write()?;
    for proposal in accepted {
        let entry = DictionaryEntry::new(proposal.category, &proposal.incorrect, &proposal.correct)
            .with_provenance(today, &proposal.source_case_id);

        match writer.draft_mut().insert_new(entry) {
            Ok(InsertOutcome::Added) => report.added += 1,
            Ok(InsertOutcome::AlreadyPresent) => report.already_present += 1,
            Ok(InsertOutcome::Conflicting { existing }) => {
                warn!(
                    "Merge conflict on {:?}: dictionary has {:?}, proposal says {:?}",
                    proposal.incorrect, existing, proposal.correct
                );
                report.conflicts.push(MergeConflict {
                    incorrect: proposal.incorrect.clone(),
                    proposed: proposal.correct.clone(),
                    existing,
                });
            }
            Err(e @ (DictionaryError::InvalidEntry(_) | DictionaryError::ChainedEntry { .. })) => {
                warn!("Merge skipped {:?}: {e}", proposal.incorrect);
                report.invalid.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    if report.added > 0 {
        report.commit = Some(writer.commit()?);
    }
    info!(
        "Merge: {} added, {} already present, {} conflicts, {} invalid",
        report.added,
        report.already_present,
        report.conflicts.len(),
        report.invalid.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{CorrectionCategory, Dictionary};
    use std::fs;
    use tempfile::tempdir;

    fn proposal(incorrect: &str, correct: &str, category: CorrectionCategory) -> LearningProposal {
        LearningProposal {
            incorrect: incorrect.into(),
            correct: correct.into(),
            similarity: 0.9,
            category,
            context: String::new(),
            occurrences: 1,
            status: ProposalStatus::Pending,
            source_case_id: "MC3-16722".into(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn only_accepted_proposals_are_merged() {
        let dir = tempdir().expect("temp dir");
        let store = DictionaryStore::open(dir.path().join("d.json"), dir.path().join("bk")).unwrap();

        let mut accepted = proposal("Michoacan", "Michoacán", CorrectionCategory::ProperNounsDiacritics);
        accepted.accept();
        let pending = proposal("citoyen", "citoyenne", CorrectionCategory::GrammaticalAgreement);
        let mut rejected = proposal("Merida", "Mérida", CorrectionCategory::ProperNounsDiacritics);
        rejected.reject();

        let report = merge_accepted(&store, &[accepted, pending, rejected], today()).unwrap();
        assert_eq!(report.added, 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.entry_count(), 1);
        let record = snapshot
            .get(CorrectionCategory::ProperNounsDiacritics, "Michoacan")
            .unwrap();
        assert_eq!(record.added_on, Some(today()));
        assert_eq!(record.source_case_id.as_deref(), Some("MC3-16722"));
    }

    #[test]
    fn merge_backs_up_pre_merge_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("d.json");
        let store = DictionaryStore::open(&path, dir.path().join("bk")).unwrap();
        store
            .upsert_manual(DictionaryEntry::new(
                CorrectionCategory::LegalTerms,
                "en virtu",
                "en vertu",
            ))
            .unwrap();
        let before = fs::read(&path).unwrap();

        let mut p = proposal("Etat", "État", CorrectionCategory::ProperNounsDiacritics);
        p.accept();
        let report = merge_accepted(&store, &[p], today()).unwrap();

        let commit = report.commit.expect("merge must commit");
        assert_eq!(fs::read(&commit.backup_path).unwrap(), before);
        let restored =
            Dictionary::from_json_str(&String::from_utf8(before).unwrap()).unwrap();
        assert_eq!(restored.entry_count(), 1);
        assert_eq!(store.snapshot().entry_count(), 2);
    }

    #[test]
    fn conflicts_never_overwrite() {
        let dir = tempdir().expect("temp dir");
        let store = DictionaryStore::open(dir.path().join("d.json"), dir.path().join("bk")).unwrap();
        store
            .upsert_manual(DictionaryEntry::new(
                CorrectionCategory::LegalTerms,
                "article 87",
                "article 96",
            ))
            .unwrap();

        let mut p = proposal("article 87", "article 97", CorrectionCategory::LegalTerms);
        p.accept();
        let report = merge_accepted(&store, &[p], today()).unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.commit.is_none());
        assert_eq!(store.version(), 1);
        assert_eq!(
            store
                .snapshot()
                .get(CorrectionCategory::LegalTerms, "article 87")
                .unwrap()
                .correct,
            "article 96"
        );
    }

    #[test]
    fn chained_proposal_is_reported_not_fatal() {
        let dir = tempdir().expect("temp dir");
        let store = DictionaryStore::open(dir.path().join("d.json"), dir.path().join("bk")).unwrap();
        store
            .upsert_manual(DictionaryEntry::new(
                CorrectionCategory::MisrecognizedVocabulary,
                "affairement",
                "avortement",
            ))
            .unwrap();

        let mut chained = proposal("avortement", "avortements", CorrectionCategory::GrammaticalAgreement);
        chained.accept();
        let mut fine = proposal("Etat", "État", CorrectionCategory::ProperNounsDiacritics);
        fine.accept();

        let report = merge_accepted(&store, &[chained, fine], today()).unwrap();
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(report.added, 1);
    }

    #[test]
    fn concurrent_writer_fails_loudly() {
        let dir = tempdir().expect("temp dir");
        let store = DictionaryStore::open(dir.path().join("d.json"), dir.path().join("bk")).unwrap();
        let _held = store.begin_write().unwrap();

        let mut p = proposal("Etat", "État", CorrectionCategory::ProperNounsDiacritics);
        p.accept();
        let err = merge_accepted(&store, &[p], today()).unwrap_err();
        assert!(matches!(err, DictionaryError::WriteConflict(_)));
    }

    #[test]
    fn nothing_accepted_touches_nothing() {
        let dir = tempdir().expect("temp dir");
        let store = DictionaryStore::open(dir.path().join("d.json"), dir.path().join("bk")).unwrap();
        let p = proposal("Etat", "État", CorrectionCategory::ProperNounsDiacritics);
        let report = merge_accepted(&store, &[p], today()).unwrap();
        assert_eq!(report, MergeReport::default());
        assert!(store.list_backups().unwrap().is_empty());
    }
}
