//! Semantic retrieval over policy clauses, used as a confidence signal.

mod chain;
mod http;
mod index;
mod provider;

pub use chain::ProviderChain;
pub use http::{HttpEmbeddingProvider, DEFAULT_EMBEDDING_ENDPOINT, DEFAULT_EMBEDDING_MODEL};
pub use index::{
    build_query, RetrievalIndex, RetrievalOutcome, CLAUSE_ACCEPTANCE_THRESHOLD, DEFAULT_QUERY,
};
pub use provider::{
    cosine_similarity, DisabledEmbedder, EmbeddingProvider, HashedTermEmbedder, RetrievalError,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rules::{DocumentReference, OutcomeEffect, Rule, RulePriority};

    fn rule(id: &str, description: &str) -> Rule {
        Rule {
            id: id.to_string(),
            name: id.to_string(),
            condition_expression: "true".to_string(),
            variables_required: Vec::new(),
            outcome_effect: OutcomeEffect {
                eligible: true,
                score_delta: 10,
            },
            priority: RulePriority::Medium,
            mandatory: false,
            document_reference: DocumentReference {
                doc_id: "policy".to_string(),
                page: 1,
                section: "1".to_string(),
            },
            human_description: description.to_string(),
        }
    }

    /// Maps known texts to fixed two-dimensional vectors.
    struct FixedEmbedder(Vec<(&'static str, [f32; 2])>);

    impl EmbeddingProvider for FixedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
            self.0
                .iter()
                .find(|(known, _)| *known == text)
                .map(|(_, vector)| vector.to_vec())
                .ok_or_else(|| RetrievalError::Provider {
                    provider: "fixed".to_string(),
                    reason: format!("no vector for '{text}'"),
                })
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn exact_clause_is_returned_first() {
        let rules = vec![
            rule("income", "Household income must not exceed the annual limit"),
            rule("residency", "Applicant must reside in the district"),
            rule("blank", "   "),
        ];
        let index = RetrievalIndex::build(Arc::new(HashedTermEmbedder::new(384)), &rules);
        assert_eq!(index.len(), 2);
        assert_eq!(index.rule_ids().collect::<Vec<_>>(), ["income", "residency"]);

        let outcome = index.search("Household income must not exceed the annual limit", 3);
        assert_eq!(
            outcome.clauses.first().map(String::as_str),
            Some("Household income must not exceed the annual limit")
        );
        assert!((outcome.max_similarity - 1.0).abs() < 1e-4);
    }

    #[test]
    fn below_threshold_matches_still_report_similarity() {
        let provider = FixedEmbedder(vec![
            ("clause a", [1.0, 0.0]),
            ("clause b", [0.0, 1.0]),
            // cos = 0.5 against clause a
            ("query", [0.5, 0.866_025_4]),
        ]);
        let rules = vec![rule("a", "clause a"), rule("b", "clause b")];
        let index = RetrievalIndex::build(Arc::new(provider), &rules);

        let outcome = index.search("query", 3);
        assert_eq!(outcome.clauses, vec!["clause b".to_string()]);
        assert!((outcome.max_similarity - 0.866).abs() < 1e-3);

        let weak = FixedEmbedder(vec![("clause a", [1.0, 0.0]), ("query", [0.5, 0.866_025_4])]);
        let index = RetrievalIndex::build(Arc::new(weak), &[rule("a", "clause a")]);
        let outcome = index.search("query", 3);
        assert!(outcome.clauses.is_empty());
        assert!((outcome.max_similarity - 0.5).abs() < 1e-3);
    }

    #[test]
    fn results_are_capped_at_k() {
        let provider = FixedEmbedder(vec![
            ("one", [1.0, 0.0]),
            ("two", [0.9, 0.1]),
            ("three", [0.8, 0.2]),
            ("query", [1.0, 0.0]),
        ]);
        let rules = vec![rule("1", "one"), rule("2", "two"), rule("3", "three")];
        let index = RetrievalIndex::build(Arc::new(provider), &rules);

        let outcome = index.search("query", 2);
        assert_eq!(outcome.clauses, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn negative_similarity_is_clamped_to_zero() {
        let provider = FixedEmbedder(vec![("clause", [1.0, 0.0]), ("query", [-1.0, 0.0])]);
        let index = RetrievalIndex::build(Arc::new(provider), &[rule("a", "clause")]);

        let outcome = index.search("query", 3);
        assert!(outcome.clauses.is_empty());
        assert_eq!(outcome.max_similarity, 0.0);
    }

    #[test]
    fn empty_or_unavailable_index_degrades_to_zero() {
        let index = RetrievalIndex::build(Arc::new(HashedTermEmbedder::new(64)), &[]);
        assert!(index.is_empty());
        assert_eq!(index.search("anything", 3), RetrievalOutcome::default());

        let disabled = RetrievalIndex::build(Arc::new(DisabledEmbedder), &[rule("a", "clause")]);
        assert!(disabled.is_empty());
        assert_eq!(disabled.search("clause", 3), RetrievalOutcome::default());
    }

    #[test]
    fn query_failure_degrades_to_zero() {
        let provider = FixedEmbedder(vec![("clause", [1.0, 0.0])]);
        let index = RetrievalIndex::build(Arc::new(provider), &[rule("a", "clause")]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.search("unknown", 3), RetrievalOutcome::default());
    }

    #[test]
    fn query_joins_failed_names_or_falls_back() {
        assert_eq!(build_query(Vec::<&str>::new()), DEFAULT_QUERY);
        assert_eq!(build_query(["Income Limit", "Residency"]), "Income Limit Residency");
    }

    #[test]
    fn chain_falls_back_when_the_primary_cannot_embed() {
        let rules = vec![rule("income", "Household income must not exceed the annual limit")];
        let chain = ProviderChain::new(Arc::new(FixedEmbedder(Vec::new())))
            .with_fallback(Arc::new(HashedTermEmbedder::new(384)));
        assert_eq!(chain.primary_name(), "fixed");

        let index = chain.build_index(&rules);

        assert_eq!(index.provider_name(), "hashed-term");
        assert_eq!(index.len(), 1);
        let outcome = index.search("Household income must not exceed the annual limit", 3);
        assert_eq!(outcome.clauses.len(), 1);
    }

    #[test]
    fn chain_prefers_the_primary() {
        let provider = FixedEmbedder(vec![("clause", [1.0, 0.0]), ("query", [1.0, 0.0])]);
        let chain = ProviderChain::new(Arc::new(provider))
            .with_fallback(Arc::new(HashedTermEmbedder::new(64)));

        let index = chain.build_index(&[rule("a", "clause")]);

        assert_eq!(index.provider_name(), "fixed");
        assert_eq!(index.search("query", 3).max_similarity, 1.0);
    }

    #[test]
    fn exhausted_chain_yields_an_empty_index() {
        let chain = ProviderChain::new(Arc::new(DisabledEmbedder))
            .with_fallback(Arc::new(FixedEmbedder(Vec::new())));

        let index = chain.build_index(&[rule("a", "clause")]);

        assert!(index.is_empty());
        assert_eq!(index.search("clause", 3), RetrievalOutcome::default());
    }
}
