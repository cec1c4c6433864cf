//! Score aggregation, confidence, and the governance override.

mod confidence;
mod governance;
mod scorer;

pub use confidence::{ConfidenceVector, DataCompleteness, RuleCoverage};
pub use governance::apply_governance;
pub use scorer::{
    deterministic_label, eligibility_score, DecisionLabel, DecisionThresholds,
    DATA_COMPLETENESS_MIN, ELIGIBLE_THRESHOLD, RETRIEVAL_MIN_CONFIDENCE, REVIEW_THRESHOLD,
};
