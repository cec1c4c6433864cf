//! Per-rule evaluation against request inputs.

mod context;
mod evaluator;

#[cfg(test)]
mod tests;

pub use context::{EvaluationContext, InputValue};
pub use evaluator::{evaluate_rule, RuleResult};
