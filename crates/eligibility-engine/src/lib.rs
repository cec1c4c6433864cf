//! Governed eligibility decisions over versioned declarative rulesets.
//!
//! A request names a ruleset and supplies input values. Every rule's condition
//! is checked by a restricted expression interpreter, passed rules contribute
//! score, and the deterministic label is then validated against a retrieval
//! index over the rules' policy clauses before the governance layer settles on
//! the final outcome.

pub mod audit;
pub mod config;
pub mod decision;
pub mod error;
pub mod evaluation;
pub mod expression;
pub mod retrieval;
pub mod rules;
pub mod scoring;
pub mod telemetry;

pub use decision::{decision_router, Decision, DecisionRequest, DecisionService};
pub use evaluation::{EvaluationContext, InputValue, RuleResult};
pub use rules::{Rule, RuleStore};
pub use scoring::{ConfidenceVector, DecisionLabel};
