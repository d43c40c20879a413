//! Section extraction: isolates the legally significant part of a hearing.
//!
//! Some document variants keep only a sub-section of the hearing (for
//! example the member's oral reasons for decision). [`SectionExtractor`]
//! finds that sub-section by ordered regex matching over the utterance
//! stream; variants that keep the whole hearing never reach it.
//!
//! | Outcome | Meaning | Caller action |
//! |---------|---------|---------------|
//! | `Found` + `Ok` | section within the word band | continue |
//! | `Found` + `OutOfRange` | section outside the band | continue, raise a warning |
//! | `NotFound` | no start pattern matched | abort this document |

pub mod section;
pub mod variant;

pub use section::{
    ExtractedSection, ExtractionResult, ExtractionStatus, SectionExtractor, SectionLookup,
};
pub use variant::{default_variants, SectionVariant, RPD_REASONS};

use thiserror::Error;

// ---------------------------------------------------------------------------
// ExtractError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExtractError {
    /// No start pattern matched anywhere in the stream.
    #[error("no section start found for variant {variant:?}")]
    BoundaryNotFound { variant: String },

    /// A configured boundary pattern is not a valid regex.
    #[error("invalid boundary pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An extracting variant was configured without start patterns.
    #[error("variant requires extraction but defines no start patterns")]
    NoStartPatterns,
}
