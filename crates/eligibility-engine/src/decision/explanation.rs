use std::fmt::Write;

use super::domain::Decision;
use crate::scoring::DecisionLabel;

/// Renders a plain-text report of a decision for reviewers and applicants.
///
/// Sections with nothing to say are omitted.
pub fn generate_explanation(decision: &Decision) -> String {
    let mut out = String::new();
    let confidence = &decision.confidence_vector;

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Final decision: {}", decision.decision_label);
    let _ = writeln!(
        out,
        "- Eligibility score: {}/100",
        decision.eligibility_score
    );
    let _ = writeln!(out, "- Rule confidence: {}%", decision.confidence_score);
    out.push('\n');

    out.push_str("Confidence breakdown:\n");
    let _ = writeln!(out, "- Rule coverage: {}%", confidence.rule_confidence);
    let _ = writeln!(
        out,
        "- Retrieval confidence: {}%",
        confidence.retrieval_confidence
    );
    let _ = writeln!(out, "- Data completeness: {}%", confidence.data_completeness);
    out.push('\n');

    match decision.decision_label {
        DecisionLabel::Review => {
            out.push_str(
                "This application requires manual review due to trust thresholds or policy validation checks.\n\n",
            );
        }
        DecisionLabel::NotEligible => {
            out.push_str(
                "The application does not meet one or more mandatory eligibility criteria.\n\n",
            );
        }
        DecisionLabel::Eligible => {}
    }

    if !decision.failed_rules.is_empty() {
        out.push_str("Rules not satisfied:\n");
        for rule in &decision.failed_rules {
            let _ = writeln!(out, "- {}: {}", rule.name, rule.reason);
            if let Some(suggestion) = &rule.suggestion {
                let _ = writeln!(out, "  Suggestion: {suggestion}");
            }
        }
        out.push('\n');
    }

    if !decision.passed_rules.is_empty() {
        out.push_str("Criteria met:\n");
        for rule in &decision.passed_rules {
            let _ = writeln!(out, "- {}: {}", rule.name, rule.reason);
        }
        out.push('\n');
    }

    if !decision.relevant_clauses.is_empty() {
        out.push_str("Supporting policy references:\n");
        for clause in &decision.relevant_clauses {
            let _ = writeln!(out, "> {clause}");
        }
        out.push('\n');
    }

    out.push_str("---\n");
    out.push_str(
        "This decision was computed using deterministic policy rules with governance safeguards.",
    );
    out
}
