use serde::{Deserialize, Serialize};

/// Three-part confidence breakdown, each component in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceVector {
    pub rule_confidence: u8,
    pub retrieval_confidence: u8,
    pub data_completeness: u8,
}

/// How much of the ruleset produced a result for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCoverage {
    pub passed: usize,
    pub failed: usize,
    pub total_rules: usize,
}

/// Completeness signal supplied independently of coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataCompleteness {
    pub evaluated: usize,
    pub total_rules: usize,
}

impl DataCompleteness {
    pub fn ratio(&self) -> f64 {
        self.evaluated as f64 / self.total_rules.max(1) as f64
    }
}

impl RuleCoverage {
    pub fn ratio(&self) -> f64 {
        (self.passed + self.failed) as f64 / self.total_rules.max(1) as f64
    }
}

impl ConfidenceVector {
    pub fn aggregate(
        coverage: RuleCoverage,
        max_similarity: f32,
        completeness: DataCompleteness,
    ) -> Self {
        Self {
            rule_confidence: percent(coverage.ratio()),
            retrieval_confidence: percent(f64::from(max_similarity)),
            data_completeness: percent(completeness.ratio()),
        }
    }
}

/// Rounds half away from zero and clamps into `0..=100`.
fn percent(ratio: f64) -> u8 {
    if !ratio.is_finite() {
        return 0;
    }
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}
