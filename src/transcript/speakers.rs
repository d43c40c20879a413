//! Diarization labels to tribunal roles.
//!
//! The speech-to-text service tags turns with opaque labels (`"A"`, `"B"` …).
//! Roles are handed out by speaking volume: the label with the most text
//! gets the variant's first role (the presiding member), the next one the
//! second role, and so on.
//!
//! | Rank | `rpd_reasons` | `rad_full` |
//! |------|---------------|------------|
//! | 1 | COMMISSAIRE | COMMISSAIRE |
//! | 2 | AUTRE | DEMANDEUR D'ASILE |
//! | 3 | AUTRE | CONSEIL |
//! | beyond the list | AUTRE | LOCUTEUR `<label>` |

use std::collections::BTreeMap;

use log::info;

use super::utterance::Utterance;

/// Label → role assignment for one hearing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerRoles {
    roles: BTreeMap<String, String>,
}

impl SpeakerRoles {
    /// Rank every label in `utterances` by character volume (ties go to the
    /// label heard first) and assign `roles` in that order.
    ///
    /// Labels past the end of `roles` get `others` when set, otherwise
    /// `LOCUTEUR <label>`.
    ///
    /// ```
    /// use transcript_qa::transcript::{SpeakerRoles, Utterance};
    ///
    /// let stream = vec![
    ///     Utterance::new("Bonjour.").with_speaker("B"),
    ///     Utterance::new("Nous sommes ici pour entendre votre demande.").with_speaker("A"),
    /// ];
    /// let roles = SpeakerRoles::assign(&stream, &["COMMISSAIRE".to_string()], Some("AUTRE"));
    /// assert_eq!(roles.role("A"), Some("COMMISSAIRE"));
    /// assert_eq!(roles.role("B"), Some("AUTRE"));
    /// ```
    pub fn assign(utterances: &[Utterance], roles: &[String], others: Option<&str>) -> Self {
        // (label, chars, first index)
        let mut volume: Vec<(&str, usize, usize)> = Vec::new();
        for (index, utterance) in utterances.iter().enumerate() {
            let Some(label) = utterance.speaker_tag.as_deref() else {
                continue;
            };
            let chars = utterance.text.trim().chars().count();
            match volume.iter_mut().find(|entry| entry.0 == label) {
                Some(entry) => entry.1 += chars,
                None => volume.push((label, chars, index)),
            }
        }
        volume.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let mut assigned = BTreeMap::new();
        for (rank, (label, chars, _)) in volume.iter().enumerate() {
            let role = match (roles.get(rank), others) {
                (Some(role), _) => role.clone(),
                (None, Some(other)) => other.to_string(),
                (None, None) => format!("LOCUTEUR {label}"),
            };
            info!("Speaker {label} -> {role} ({chars} chars)");
            assigned.insert(label.to_string(), role);
        }
        Self { roles: assigned }
    }

    pub fn role(&self, label: &str) -> Option<&str> {
        self.roles.get(label).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.roles
    }
}

/// One line per non-blank utterance, like [`join_text`](super::join_text),
/// with `ROLE : ` in front of each line where the speaker changes.
///
/// Untagged utterances (and labels without a role) continue the current
/// turn unprefixed.
pub fn render_dialogue(utterances: &[Utterance], roles: &SpeakerRoles) -> String {
    let mut lines = Vec::with_capacity(utterances.len());
    let mut current: Option<&str> = None;

    for utterance in utterances {
        let text = utterance.text.trim();
        if text.is_empty() {
            continue;
        }
        let role = utterance.speaker_tag.as_deref().and_then(|l| roles.role(l));
        match role {
            Some(role) if current != Some(role) => {
                lines.push(format!("{role} : {text}"));
                current = Some(role);
            }
            _ => lines.push(text.to_string()),
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::join_text;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    fn hearing() -> Vec<Utterance> {
        vec![
            Utterance::new("Bonjour, nous allons commencer l'audience.").with_speaker("B"),
            Utterance::new("Merci.").with_speaker("A"),
            Utterance::new("Je représente le demandeur.").with_speaker("C"),
            Utterance::new("Veuillez décrire ce qui s'est passé à Michoacán.").with_speaker("B"),
            Utterance::new("Oui.").with_speaker("A"),
        ]
    }

    #[test]
    fn most_talkative_label_presides() {
        let assigned = SpeakerRoles::assign(
            &hearing(),
            &roles(&["COMMISSAIRE", "DEMANDEUR D'ASILE", "CONSEIL"]),
            None,
        );
        assert_eq!(assigned.role("B"), Some("COMMISSAIRE"));
        assert_eq!(assigned.role("C"), Some("DEMANDEUR D'ASILE"));
        assert_eq!(assigned.role("A"), Some("CONSEIL"));
    }

    #[test]
    fn labels_beyond_the_list_fall_back() {
        let stream = hearing();
        let named = SpeakerRoles::assign(&stream, &roles(&["COMMISSAIRE"]), None);
        assert_eq!(named.role("A"), Some("LOCUTEUR A"));

        let grouped = SpeakerRoles::assign(&stream, &roles(&["COMMISSAIRE"]), Some("AUTRE"));
        assert_eq!(grouped.role("A"), Some("AUTRE"));
        assert_eq!(grouped.role("C"), Some("AUTRE"));
    }

    #[test]
    fn equal_volume_goes_to_first_heard() {
        let stream = vec![
            Utterance::new("abc").with_speaker("Z"),
            Utterance::new("xyz").with_speaker("Y"),
        ];
        let assigned = SpeakerRoles::assign(&stream, &roles(&["COMMISSAIRE", "CONSEIL"]), None);
        assert_eq!(assigned.role("Z"), Some("COMMISSAIRE"));
        assert_eq!(assigned.role("Y"), Some("CONSEIL"));
    }

    #[test]
    fn dialogue_prefixes_turn_changes_only() {
        let stream = vec![
            Utterance::new("Bonjour.").with_speaker("A"),
            Utterance::new("Nous commençons.").with_speaker("A"),
            Utterance::new("  ").with_speaker("B"),
            Utterance::new("Merci.").with_speaker("B"),
            Utterance::new("Continuez."),
            Utterance::new("Alors.").with_speaker("A"),
        ];
        let assigned = SpeakerRoles::assign(&stream, &roles(&["COMMISSAIRE", "CONSEIL"]), None);
        assert_eq!(
            render_dialogue(&stream, &assigned),
            "COMMISSAIRE : Bonjour.\nNous commençons.\nCONSEIL : Merci.\nContinuez.\nCOMMISSAIRE : Alors."
        );
    }

    #[test]
    fn untagged_stream_renders_like_plain_join() {
        let stream = vec![Utterance::new(" Bonjour. "), Utterance::new("Merci.")];
        let assigned = SpeakerRoles::assign(&stream, &roles(&["COMMISSAIRE"]), None);
        assert!(assigned.is_empty());
        assert_eq!(render_dialogue(&stream, &assigned), join_text(&stream));
    }
}
