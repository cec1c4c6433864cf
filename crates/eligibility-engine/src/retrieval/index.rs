use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::provider::{cosine_similarity, EmbeddingProvider, RetrievalError};
use crate::rules::Rule;

/// Minimum similarity for a clause to be returned as supporting context.
pub const CLAUSE_ACCEPTANCE_THRESHOLD: f32 = 0.60;

/// Query used when every rule passed.
pub const DEFAULT_QUERY: &str = "General eligibility criteria";

#[derive(Debug, Clone)]
struct IndexedClause {
    rule_id: String,
    text: String,
    embedding: Vec<f32>,
}

/// Clauses accepted for a query plus the strongest similarity seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalOutcome {
    pub clauses: Vec<String>,
    pub max_similarity: f32,
}

/// Semantic index over one ruleset's policy clauses.
///
/// Built once per ruleset load and read-only afterwards, so a shared
/// `Arc<RetrievalIndex>` can serve concurrent searches.
pub struct RetrievalIndex {
    provider: Arc<dyn EmbeddingProvider>,
    clauses: Vec<IndexedClause>,
}

impl RetrievalIndex {
    /// Embeds every non-empty `human_description`. A provider failure leaves
    /// the index empty, which searches treat as degraded mode.
    pub fn build(provider: Arc<dyn EmbeddingProvider>, rules: &[Rule]) -> Self {
        match Self::try_build(Arc::clone(&provider), rules) {
            Ok(index) => index,
            Err(err) => {
                warn!(error = %err, "retrieval index left empty");
                Self::empty(provider)
            }
        }
    }

    pub(crate) fn empty(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            clauses: Vec::new(),
        }
    }

    /// Like [`RetrievalIndex::build`] but reports why the clauses could not be embedded.
    pub fn try_build(
        provider: Arc<dyn EmbeddingProvider>,
        rules: &[Rule],
    ) -> Result<Self, RetrievalError> {
        if !provider.is_available() {
            return Err(RetrievalError::Unavailable {
                provider: provider.name().to_string(),
            });
        }

        let mut clauses = Vec::new();
        for rule in rules {
            let text = rule.human_description.trim();
            if text.is_empty() {
                continue;
            }
            clauses.push(IndexedClause {
                rule_id: rule.id.clone(),
                text: text.to_string(),
                embedding: provider.embed(text)?,
            });
        }

        Ok(Self { provider, clauses })
    }

    /// Name of the provider that embedded the clauses and answers queries.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Rule ids in index order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|clause| clause.rule_id.as_str())
    }

    /// Up to `k` clauses at or above [`CLAUSE_ACCEPTANCE_THRESHOLD`], strongest
    /// first, and the maximum similarity over the whole index regardless of
    /// the threshold.
    pub fn search(&self, query: &str, k: usize) -> RetrievalOutcome {
        match self.try_search(query, k) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "retrieval degraded; reporting zero similarity");
                RetrievalOutcome::default()
            }
        }
    }

    fn try_search(&self, query: &str, k: usize) -> Result<RetrievalOutcome, RetrievalError> {
        if self.clauses.is_empty() {
            return Ok(RetrievalOutcome::default());
        }

        let query_embedding = self.provider.embed(query)?;

        let mut scored: Vec<(f32, &IndexedClause)> = self
            .clauses
            .iter()
            .map(|clause| (cosine_similarity(&clause.embedding, &query_embedding), clause))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let max_similarity = scored
            .first()
            .map(|(similarity, _)| similarity.clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let clauses = scored
            .iter()
            .filter(|(similarity, _)| *similarity >= CLAUSE_ACCEPTANCE_THRESHOLD)
            .take(k)
            .map(|(_, clause)| clause.text.clone())
            .collect();

        Ok(RetrievalOutcome {
            clauses,
            max_similarity,
        })
    }
}

/// Failed rule names joined by spaces, or [`DEFAULT_QUERY`] when nothing failed.
pub fn build_query<'a>(failed_rule_names: impl IntoIterator<Item = &'a str>) -> String {
    let names: Vec<&str> = failed_rule_names.into_iter().collect();
    if names.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        names.join(" ")
    }
}
