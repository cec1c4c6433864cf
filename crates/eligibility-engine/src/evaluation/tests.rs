use super::*;
use crate::rules::{DocumentReference, OutcomeEffect, Rule, RulePriority};

fn rule(id: &str, expression: &str, variables: &[&str], score_delta: i32, mandatory: bool) -> Rule {
    Rule {
        id: id.to_string(),
        name: format!("Rule {id}"),
        condition_expression: expression.to_string(),
        variables_required: variables.iter().map(|name| name.to_string()).collect(),
        outcome_effect: OutcomeEffect {
            eligible: true,
            score_delta,
        },
        priority: RulePriority::High,
        mandatory,
        document_reference: DocumentReference {
            doc_id: "scheme-2024".to_string(),
            page: 3,
            section: "2.1".to_string(),
        },
        human_description: "Household income ceiling".to_string(),
    }
}

#[test]
fn passing_rule_reports_observed_values_and_score() {
    let rule = rule("R1", "income <= 800000 and state == 'IA'", &["income", "state"], 40, true);
    let context = EvaluationContext::new()
        .with("income", 650000)
        .with("state", "IA");

    let result = evaluate_rule(&rule, &context);

    assert!(result.passed);
    assert_eq!(result.score_delta, 40);
    assert_eq!(
        result.reason,
        "Condition met: income <= 800000 and state == 'IA' where income = 650000, state = 'IA'"
    );
    assert!(result.suggestion.is_none());
    assert_eq!(result.document_reference.page, 3);
    assert!(result.mandatory);
}

#[test]
fn failing_upper_bound_suggests_decrease() {
    let rule = rule("R1", "income <= 800000", &["income"], 40, true);
    let context = EvaluationContext::new().with("income", 900000);

    let result = evaluate_rule(&rule, &context);

    assert!(!result.passed);
    assert_eq!(result.score_delta, 0);
    assert_eq!(
        result.reason,
        "Condition failed: income <= 800000 where income = 900000"
    );
    assert_eq!(
        result.suggestion.as_deref(),
        Some("decrease income by 100000.00")
    );
}

#[test]
fn failing_lower_bound_suggests_increase() {
    let rule = rule("R2", "18 <= age", &["age"], 20, false);
    let context = EvaluationContext::new().with("age", 15);

    let result = evaluate_rule(&rule, &context);

    assert_eq!(result.suggestion.as_deref(), Some("increase age by 3.00"));
}

#[test]
fn nearest_violated_bound_wins() {
    let rule = rule(
        "R3",
        "credit_score >= 700 and income >= 50000.5",
        &["income", "credit_score"],
        10,
        false,
    );
    let context = EvaluationContext::new()
        .with("income", 50000)
        .with("credit_score", 650);

    let result = evaluate_rule(&rule, &context);

    assert_eq!(result.suggestion.as_deref(), Some("increase income by 0.50"));
}

#[test]
fn missing_inputs_are_named_without_evaluating() {
    let rule = rule("R4", "age >= 18 and income < 10", &["age", "income", "state"], 10, false);
    let context = EvaluationContext::new().with("income", 5);

    let result = evaluate_rule(&rule, &context);

    assert!(!result.passed);
    assert_eq!(result.score_delta, 0);
    assert_eq!(result.reason, "Missing required input(s): age, state");
    assert!(result.suggestion.is_none());
}

#[test]
fn unsafe_expression_fails_deterministically() {
    let rule = rule("R5", "__import__('os').system('id')", &["income"], 10, false);
    let context = EvaluationContext::new().with("income", 5);

    let first = evaluate_rule(&rule, &context);
    let second = evaluate_rule(&rule, &context);

    assert!(!first.passed);
    assert!(first.reason.starts_with("unsafe expression detected"));
    assert_eq!(first.score_delta, 0);
    assert!(first.suggestion.is_none());
    assert_eq!(first, second);
}

#[test]
fn oversized_expression_fails_without_evaluating() {
    let expression = format!("x{}", " and x".repeat(20_000));
    let rule = rule("R8", &expression, &["x"], 10, false);
    let context = EvaluationContext::new().with("x", true);

    let result = evaluate_rule(&rule, &context);

    assert!(!result.passed);
    assert_eq!(
        result.reason,
        "unsafe expression detected: expression too large"
    );
    assert_eq!(result.score_delta, 0);
    assert!(result.suggestion.is_none());
}

#[test]
fn type_mismatch_becomes_failed_result() {
    let rule = rule("R6", "state > 5", &["state"], 10, false);
    let context = EvaluationContext::new().with("state", "IA");

    let result = evaluate_rule(&rule, &context);

    assert!(!result.passed);
    assert!(result.reason.starts_with("Error evaluating rule:"));
    assert!(result.suggestion.is_none());
    assert_eq!(result.score_delta, 0);
}

#[test]
fn non_numeric_variables_get_no_suggestion() {
    let rule = rule("R7", "resident == true", &["resident"], 10, false);
    let context = EvaluationContext::new().with("resident", false);

    let result = evaluate_rule(&rule, &context);

    assert!(!result.passed);
    assert!(result.suggestion.is_none());
}
