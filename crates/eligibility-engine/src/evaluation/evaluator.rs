use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::EvaluationContext;
use crate::expression::{self, BoundKind, ExpressionError};
use crate::rules::{DocumentReference, Rule, RulePriority};

/// Outcome of checking one rule against one request.
///
/// `score_delta` is zero unless `passed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub id: String,
    pub name: String,
    pub passed: bool,
    pub reason: String,
    pub priority: RulePriority,
    pub mandatory: bool,
    pub document_reference: DocumentReference,
    pub score_delta: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl RuleResult {
    fn from_rule(rule: &Rule, passed: bool, reason: String) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            passed,
            reason,
            priority: rule.priority,
            mandatory: rule.mandatory,
            document_reference: rule.document_reference.clone(),
            score_delta: if passed {
                rule.outcome_effect.score_delta
            } else {
                0
            },
            suggestion: None,
        }
    }
}

/// Checks a single rule against the supplied inputs.
///
/// Every failure mode (missing inputs, an expression outside the grammar, a
/// runtime type error) resolves to a failed result; nothing is propagated.
pub fn evaluate_rule(rule: &Rule, context: &EvaluationContext) -> RuleResult {
    let missing: Vec<&str> = rule
        .variables_required
        .iter()
        .filter(|name| !context.contains(name))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        debug!(rule_id = %rule.id, ?missing, "rule skipped for missing inputs");
        return RuleResult::from_rule(
            rule,
            false,
            format!("Missing required input(s): {}", missing.join(", ")),
        );
    }

    let expr = match expression::parse(&rule.condition_expression) {
        Ok(expr) => expr,
        Err(err) => {
            debug!(rule_id = %rule.id, error = %err, "rule expression rejected");
            return RuleResult::from_rule(rule, false, err.to_string());
        }
    };

    let passed = match expression::evaluate_condition(&expr, context) {
        Ok(passed) => passed,
        Err(err) => {
            debug!(rule_id = %rule.id, error = %err, "rule evaluation failed");
            let reason = match err {
                ExpressionError::Unsafe(_) => err.to_string(),
                ExpressionError::Evaluation(detail) => {
                    format!("Error evaluating rule: {detail}")
                }
            };
            return RuleResult::from_rule(rule, false, reason);
        }
    };

    let observed = observed_values(rule, context);

    if passed {
        debug!(rule_id = %rule.id, "rule passed");
        return RuleResult::from_rule(
            rule,
            true,
            format!(
                "Condition met: {} where {}",
                rule.condition_expression, observed
            ),
        );
    }

    debug!(rule_id = %rule.id, "rule failed");
    let mut result = RuleResult::from_rule(
        rule,
        false,
        format!(
            "Condition failed: {} where {}",
            rule.condition_expression, observed
        ),
    );
    result.suggestion = suggest_adjustment(rule, context, &expr);
    result
}

fn observed_values(rule: &Rule, context: &EvaluationContext) -> String {
    rule.variables_required
        .iter()
        .filter_map(|name| context.get(name).map(|value| format!("{name} = {value}")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Picks the violated numeric bound closest to being satisfied; ties keep the
/// bound that appears first.
fn suggest_adjustment(
    rule: &Rule,
    context: &EvaluationContext,
    expr: &expression::Expr,
) -> Option<String> {
    let bounds = expression::numeric_bounds(expr);
    let mut best: Option<(f64, String)> = None;

    for name in &rule.variables_required {
        let Some(observed) = context.get(name).and_then(|value| value.as_f64()) else {
            continue;
        };

        for bound in bounds.iter().filter(|bound| &bound.variable == name) {
            let (Some(kind), Some(shortfall)) = (bound.kind(), bound.shortfall(observed)) else {
                continue;
            };

            let distance = shortfall.abs();
            if best
                .as_ref()
                .is_some_and(|(closest, _)| distance >= *closest)
            {
                continue;
            }

            let verb = match kind {
                BoundKind::Upper => "decrease",
                BoundKind::Lower => "increase",
            };
            best = Some((distance, format!("{verb} {name} by {distance:.2}")));
        }
    }

    best.map(|(_, suggestion)| suggestion)
}
