//! Transcript input model.
//!
//! The speech-to-text collaborator delivers an ordered stream of
//! [`Utterance`]s; everything downstream (extraction, correction, learning)
//! works on that abstraction only. Diarization labels are turned into
//! tribunal roles by [`SpeakerRoles`].

pub mod speakers;
pub mod utterance;

pub use speakers::{render_dialogue, SpeakerRoles};
pub use utterance::{join_text, span_ms, total_words, Utterance};
