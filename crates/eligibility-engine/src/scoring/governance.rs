use super::confidence::ConfidenceVector;
use super::scorer::{DecisionLabel, DecisionThresholds};

/// Confidence-gated override of the deterministic label.
///
/// Low retrieval confidence or low data completeness moves `Eligible` to
/// `Review`. `NotEligible` is left alone: routing it to `Review` would be an
/// upgrade, and a mandatory failure must survive low confidence.
pub fn apply_governance(
    deterministic: DecisionLabel,
    confidence: &ConfidenceVector,
    thresholds: &DecisionThresholds,
) -> DecisionLabel {
    if deterministic == DecisionLabel::NotEligible {
        return deterministic;
    }

    if confidence.retrieval_confidence < thresholds.min_retrieval_confidence {
        return DecisionLabel::Review;
    }

    if confidence.data_completeness < thresholds.min_data_completeness {
        return DecisionLabel::Review;
    }

    deterministic
}
