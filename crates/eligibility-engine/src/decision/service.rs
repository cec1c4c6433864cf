use std::sync::Arc;

use chrono::Utc;
use moka::sync::Cache;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{Decision, DecisionRequest};
use super::explanation::generate_explanation;
use crate::audit::{input_checksum, AuditSink, DecisionRecord};
use crate::config::{EmbeddingBackend, EngineConfig};
use crate::evaluation::{evaluate_rule, EvaluationContext, RuleResult};
use crate::retrieval::{
    build_query, DisabledEmbedder, EmbeddingProvider, HashedTermEmbedder, HttpEmbeddingProvider,
    ProviderChain, RetrievalIndex,
};
use crate::rules::{
    LoadError, LoadedRuleset, Rule, RuleSource, RuleStore, DEFAULT_RULESET_CACHE_CAPACITY,
};
use crate::scoring::{
    apply_governance, deterministic_label, eligibility_score, ConfidenceVector, DataCompleteness,
    DecisionThresholds, RuleCoverage,
};

pub const DEFAULT_TOP_K: usize = 3;

/// Tunables applied to every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionSettings {
    pub thresholds: DecisionThresholds,
    pub top_k: usize,
    /// Bound on cached rulesets and, separately, on cached retrieval indexes.
    pub cache_capacity: u64,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self {
            thresholds: DecisionThresholds::default(),
            top_k: DEFAULT_TOP_K,
            cache_capacity: DEFAULT_RULESET_CACHE_CAPACITY,
        }
    }
}

/// Embedding providers selected by configuration, in the order they are tried.
pub fn providers_from_config(config: &EngineConfig) -> ProviderChain {
    if !config.retrieval_enabled {
        return ProviderChain::new(Arc::new(DisabledEmbedder));
    }

    let hashed = Arc::new(HashedTermEmbedder::new(config.embedding_dimensions));
    match config.embedding_provider {
        EmbeddingBackend::Http => ProviderChain::new(Arc::new(HttpEmbeddingProvider::new(
            config.embedding_endpoint.clone(),
            config.embedding_model.clone(),
            config.embedding_dimensions,
        )))
        .with_fallback(hashed),
        EmbeddingBackend::Hashed => ProviderChain::new(hashed),
    }
}

fn index_cache(capacity: u64) -> Cache<String, Arc<RetrievalIndex>> {
    Cache::builder().max_capacity(capacity).build()
}

/// Service composing the rule store, retrieval indexes, and audit sink.
///
/// Retrieval indexes are cached by ruleset fingerprint, so every id that
/// resolves to the same document content shares one index.
pub struct DecisionService<S, A> {
    store: RuleStore<S>,
    audit: Arc<A>,
    providers: ProviderChain,
    settings: DecisionSettings,
    indexes: Cache<String, Arc<RetrievalIndex>>,
}

#[derive(Serialize)]
struct ChecksumInput<'a> {
    ruleset_id: &'a str,
    user_input: &'a EvaluationContext,
}

impl<S, A> DecisionService<S, A>
where
    S: RuleSource + 'static,
    A: AuditSink + 'static,
{
    pub fn new(source: Arc<S>, audit: Arc<A>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_providers(source, audit, ProviderChain::new(embedder))
    }

    pub fn with_providers(source: Arc<S>, audit: Arc<A>, providers: ProviderChain) -> Self {
        let settings = DecisionSettings::default();
        Self {
            store: RuleStore::with_capacity(source, settings.cache_capacity),
            audit,
            providers,
            settings,
            indexes: index_cache(settings.cache_capacity),
        }
    }

    pub fn with_settings(mut self, settings: DecisionSettings) -> Self {
        if settings.cache_capacity != self.settings.cache_capacity {
            self.store =
                RuleStore::with_capacity(Arc::clone(self.store.source()), settings.cache_capacity);
            self.indexes = index_cache(settings.cache_capacity);
        }
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &DecisionSettings {
        &self.settings
    }

    pub fn store(&self) -> &RuleStore<S> {
        &self.store
    }

    pub fn audit(&self) -> &Arc<A> {
        &self.audit
    }

    pub fn providers(&self) -> &ProviderChain {
        &self.providers
    }

    /// Number of retrieval indexes currently held.
    pub fn cached_indexes(&self) -> u64 {
        self.indexes.run_pending_tasks();
        self.indexes.entry_count()
    }

    /// Validated rules for `ruleset_id`.
    pub fn rules(&self, ruleset_id: &str) -> Result<Arc<LoadedRuleset>, LoadError> {
        self.store.load(ruleset_id)
    }

    pub fn evaluate(&self, request: &DecisionRequest) -> Result<Decision, LoadError> {
        self.evaluate_ruleset(&request.ruleset_id, &request.user_input)
    }

    /// Loads the ruleset, decides, and appends an audit record.
    ///
    /// Only ruleset load failures are returned; per-rule and retrieval
    /// problems are folded into the decision, and audit failures are logged.
    pub fn evaluate_ruleset(
        &self,
        ruleset_id: &str,
        context: &EvaluationContext,
    ) -> Result<Decision, LoadError> {
        let ruleset = self.store.load(ruleset_id)?;
        let index = self.index_for(&ruleset);

        let decision = decide(&ruleset.rules, &index, context, &self.settings);

        info!(
            ruleset_id,
            decision = %decision.decision_label,
            deterministic = %decision.deterministic_label,
            score = decision.eligibility_score,
            rule_confidence = decision.confidence_vector.rule_confidence,
            retrieval_confidence = decision.confidence_vector.retrieval_confidence,
            data_completeness = decision.confidence_vector.data_completeness,
            "decision issued"
        );

        self.record(ruleset_id, context, &decision);
        Ok(decision)
    }

    fn record(&self, ruleset_id: &str, context: &EvaluationContext, decision: &Decision) {
        let checksum = match input_checksum(&ChecksumInput {
            ruleset_id,
            user_input: context,
        }) {
            Ok(checksum) => checksum,
            Err(err) => {
                warn!(ruleset_id, error = %err, "failed to checksum request; audit record skipped");
                return;
            }
        };

        let record = DecisionRecord {
            timestamp: Utc::now(),
            ruleset_id: ruleset_id.to_string(),
            input_checksum: checksum,
            decision_label: decision.decision_label,
            eligibility_score: decision.eligibility_score,
            confidence: decision.confidence_vector,
            passed_rule_ids: decision.passed_rule_ids(),
            failed_rule_ids: decision.failed_rule_ids(),
        };

        if let Err(err) = self.audit.record(&record) {
            warn!(ruleset_id, error = %err, "failed to write audit record");
        }
    }

    /// Index for the ruleset's current content; a new fingerprint builds a new index.
    fn index_for(&self, ruleset: &LoadedRuleset) -> Arc<RetrievalIndex> {
        self.indexes.get_with(ruleset.fingerprint.clone(), || {
            let index = self.providers.build_index(&ruleset.rules);
            debug!(
                ruleset_id = %ruleset.id,
                clauses = index.len(),
                provider = index.provider_name(),
                "retrieval index built"
            );
            Arc::new(index)
        })
    }
}

/// Runs the full pipeline over already-loaded rules. Pure apart from logging.
pub fn decide(
    rules: &[Rule],
    index: &RetrievalIndex,
    context: &EvaluationContext,
    settings: &DecisionSettings,
) -> Decision {
    let results: Vec<RuleResult> = rules
        .iter()
        .map(|rule| evaluate_rule(rule, context))
        .collect();
    let (passed_rules, failed_rules): (Vec<RuleResult>, Vec<RuleResult>) =
        results.into_iter().partition(|result| result.passed);

    let score = eligibility_score(&passed_rules);
    let deterministic = deterministic_label(&failed_rules, score, &settings.thresholds);

    let query = build_query(failed_rules.iter().map(|result| result.name.as_str()));
    let retrieval = index.search(&query, settings.top_k);

    // Rules whose inputs were all supplied.
    let evaluated = rules
        .iter()
        .filter(|rule| {
            rule.variables_required
                .iter()
                .all(|name| context.contains(name))
        })
        .count();

    let confidence_vector = ConfidenceVector::aggregate(
        RuleCoverage {
            passed: passed_rules.len(),
            failed: failed_rules.len(),
            total_rules: rules.len(),
        },
        retrieval.max_similarity,
        DataCompleteness {
            evaluated,
            total_rules: rules.len(),
        },
    );

    let final_label = apply_governance(deterministic, &confidence_vector, &settings.thresholds);
    if final_label != deterministic {
        debug!(
            deterministic = %deterministic,
            governed = %final_label,
            "governance override applied"
        );
    }

    let mut decision = Decision {
        decision_label: final_label,
        deterministic_label: deterministic,
        eligibility_score: score,
        confidence_score: confidence_vector.rule_confidence,
        confidence_vector,
        passed_rules,
        failed_rules,
        relevant_clauses: retrieval.clauses,
        explanation: String::new(),
    };
    decision.explanation = generate_explanation(&decision);
    decision
}
