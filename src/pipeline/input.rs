//! JSON document input handed over by the orchestration layer.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::correct::ExpectedEntity;
use crate::transcript::Utterance;

/// One hearing to normalize and score.
///
/// ```
/// use transcript_qa::pipeline::DocumentInput;
///
/// let input: DocumentInput = serde_json::from_str(r#"{
///     "case_id": "MC3-16722",
///     "variant": "rpd_reasons",
///     "utterances": [{ "text": "Voici les motifs de la décision.", "speaker_tag": "A" }]
/// }"#).unwrap();
/// assert!(input.expected_entities.is_empty());
/// assert!(input.header_block.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub case_id: String,
    /// Key into `[extraction.variants]`.
    pub variant: String,
    pub utterances: Vec<Utterance>,
    #[serde(default)]
    pub expected_entities: Vec<ExpectedEntity>,
    /// Header text of the delivered document (case number, tribunal, title).
    #[serde(default)]
    pub header_block: Option<String>,
    /// Closing and certification text of the delivered document.
    #[serde(default)]
    pub certification_block: Option<String>,
}

impl DocumentInput {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let input = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(input)
    }

    /// Header, `body` and certification joined by blank lines, skipping the
    /// blocks that are absent.
    pub fn assemble(&self, body: &str) -> String {
        [self.header_block.as_deref(), Some(body), self.certification_block.as_deref()]
            .into_iter()
            .flatten()
            .filter(|block| !block.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn input() -> DocumentInput {
        DocumentInput {
            case_id: "MC3-16722".into(),
            variant: "rpd_reasons".into(),
            utterances: vec![Utterance::new("Voici les motifs.")],
            expected_entities: Vec::new(),
            header_block: Some("Dossier de la SPR".into()),
            certification_block: None,
        }
    }

    #[test]
    fn assemble_skips_missing_blocks() {
        assert_eq!(input().assemble("corps"), "Dossier de la SPR\n\ncorps");
    }

    #[test]
    fn from_path_reads_json() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("doc.json");
        std::fs::write(&path, serde_json::to_string(&input()).unwrap()).unwrap();
        assert_eq!(DocumentInput::from_path(&path).unwrap(), input());
    }

    #[test]
    fn from_path_names_the_file_on_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let err = DocumentInput::from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }
}
