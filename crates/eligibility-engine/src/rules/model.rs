use serde::{Deserialize, Serialize};

/// Priority tier a ruleset author assigns to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulePriority {
    High,
    Medium,
    Low,
}

impl RulePriority {
    pub fn label(&self) -> &'static str {
        match self {
            RulePriority::High => "high",
            RulePriority::Medium => "medium",
            RulePriority::Low => "low",
        }
    }
}

/// What a satisfied rule contributes to the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEffect {
    pub eligible: bool,
    pub score_delta: i32,
}

/// Location of the policy clause a rule was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub doc_id: String,
    pub page: u32,
    pub section: String,
}

/// Declarative eligibility rule as authored in a ruleset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub condition_expression: String,
    pub variables_required: Vec<String>,
    pub outcome_effect: OutcomeEffect,
    pub priority: RulePriority,
    pub mandatory: bool,
    pub document_reference: DocumentReference,
    pub human_description: String,
}
