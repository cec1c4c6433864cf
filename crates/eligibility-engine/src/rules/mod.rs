//! Ruleset definitions and the validating store that serves them.

mod model;
mod store;

pub use model::{DocumentReference, OutcomeEffect, Rule, RulePriority};
pub use store::{
    parse_ruleset, DirectoryRuleSource, InMemoryRuleSource, LoadError, LoadedRuleset, RuleSource,
    RuleStore, SourceError, DEFAULT_RULESET_CACHE_CAPACITY,
};
