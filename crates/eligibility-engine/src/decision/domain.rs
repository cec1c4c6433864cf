use serde::{Deserialize, Serialize};

use crate::evaluation::{EvaluationContext, RuleResult};
use crate::scoring::{ConfidenceVector, DecisionLabel};

/// Inbound evaluation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub ruleset_id: String,
    #[serde(default)]
    pub user_input: EvaluationContext,
}

/// Governed outcome of evaluating one ruleset against one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision_label: DecisionLabel,
    /// Label derived from rules and score before the governance override.
    pub deterministic_label: DecisionLabel,
    pub eligibility_score: i32,
    /// Mirrors `confidence_vector.rule_confidence`.
    pub confidence_score: u8,
    pub confidence_vector: ConfidenceVector,
    pub passed_rules: Vec<RuleResult>,
    pub failed_rules: Vec<RuleResult>,
    pub relevant_clauses: Vec<String>,
    pub explanation: String,
}

impl Decision {
    pub fn passed_rule_ids(&self) -> Vec<String> {
        self.passed_rules.iter().map(|rule| rule.id.clone()).collect()
    }

    pub fn failed_rule_ids(&self) -> Vec<String> {
        self.failed_rules.iter().map(|rule| rule.id.clone()).collect()
    }

    /// True when governance replaced the deterministic label.
    pub fn was_overridden(&self) -> bool {
        self.decision_label != self.deterministic_label
    }
}
