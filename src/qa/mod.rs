//! Quality scoring: composite score, structural criteria and verdict.
//!
//! | Input | Produces |
//! |-------|----------|
//! | correction records | `initial_quality_score` and statistics |
//! | assembled document | fatal and advisory criteria |
//! | both | `Verdict` and `QualityLevel` |
//!
//! A failed fatal criterion always yields [`Verdict::Fail`], whatever the
//! score. Otherwise the score bands decide (85 / 70 by default).

pub mod criteria;
pub mod scorer;
pub mod warning;

pub use criteria::{CriteriaMap, CriterionOutcome, CriterionResult};
pub use scorer::{
    initial_quality_score, QaReport, QaStatistics, QualityLevel, QualityScorer, ScoringInput,
    Verdict,
};
pub use warning::QaWarning;
