//! Decision pipeline: evaluation, scoring, retrieval validation, governance,
//! explanation, and audit, plus the HTTP router in front of it.

pub mod domain;
pub mod explanation;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{Decision, DecisionRequest};
pub use explanation::generate_explanation;
pub use router::decision_router;
pub use service::{decide, providers_from_config, DecisionService, DecisionSettings, DEFAULT_TOP_K};
