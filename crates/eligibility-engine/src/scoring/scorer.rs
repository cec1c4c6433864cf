use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evaluation::RuleResult;

pub const ELIGIBLE_THRESHOLD: i32 = 70;
pub const REVIEW_THRESHOLD: i32 = 50;
pub const RETRIEVAL_MIN_CONFIDENCE: u8 = 60;
pub const DATA_COMPLETENESS_MIN: u8 = 80;

/// Outcome label for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionLabel {
    Eligible,
    Review,
    #[serde(rename = "Not Eligible")]
    NotEligible,
}

impl DecisionLabel {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionLabel::Eligible => "Eligible",
            DecisionLabel::Review => "Review",
            DecisionLabel::NotEligible => "Not Eligible",
        }
    }
}

impl fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score and confidence cut-offs applied by the scorer and governance layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    pub eligible_score: i32,
    pub review_score: i32,
    pub min_retrieval_confidence: u8,
    pub min_data_completeness: u8,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            eligible_score: ELIGIBLE_THRESHOLD,
            review_score: REVIEW_THRESHOLD,
            min_retrieval_confidence: RETRIEVAL_MIN_CONFIDENCE,
            min_data_completeness: DATA_COMPLETENESS_MIN,
        }
    }
}

/// Sum of passed rules' score deltas, clamped to `0..=100`.
pub fn eligibility_score(passed: &[RuleResult]) -> i32 {
    let total: i64 = passed
        .iter()
        .filter(|result| result.passed)
        .map(|result| i64::from(result.score_delta))
        .sum();
    total.clamp(0, 100) as i32
}

/// A failed mandatory rule forces `NotEligible` before the score is consulted.
pub fn deterministic_label(
    failed: &[RuleResult],
    score: i32,
    thresholds: &DecisionThresholds,
) -> DecisionLabel {
    if failed.iter().any(|result| result.mandatory) {
        return DecisionLabel::NotEligible;
    }

    if score >= thresholds.eligible_score {
        DecisionLabel::Eligible
    } else if score >= thresholds.review_score {
        DecisionLabel::Review
    } else {
        DecisionLabel::NotEligible
    }
}
