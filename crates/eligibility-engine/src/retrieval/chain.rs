use std::sync::Arc;

use tracing::warn;

use super::index::RetrievalIndex;
use super::provider::{DisabledEmbedder, EmbeddingProvider};
use crate::rules::Rule;

/// Embedding providers in priority order.
///
/// An index is embedded entirely by the first provider that succeeds and
/// keeps answering queries with that same provider, so clause and query
/// vectors always come from one model.
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
}

impl ProviderChain {
    pub fn new(primary: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            providers: vec![primary],
        }
    }

    /// Appends a provider tried after every earlier one failed.
    pub fn with_fallback(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn providers(&self) -> &[Arc<dyn EmbeddingProvider>] {
        &self.providers
    }

    pub fn primary_name(&self) -> &str {
        self.providers
            .first()
            .map(|provider| provider.name())
            .unwrap_or("none")
    }

    /// Builds an index with the first provider able to embed every clause.
    /// When none can, the index is empty and searches degrade to zero.
    pub fn build_index(&self, rules: &[Rule]) -> RetrievalIndex {
        for (position, provider) in self.providers.iter().enumerate() {
            match RetrievalIndex::try_build(Arc::clone(provider), rules) {
                Ok(index) => {
                    if position > 0 {
                        warn!(
                            primary = self.primary_name(),
                            fallback = provider.name(),
                            "retrieval index built with fallback provider"
                        );
                    }
                    return index;
                }
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        error = %err,
                        "retrieval provider could not index clauses"
                    );
                }
            }
        }

        let provider: Arc<dyn EmbeddingProvider> = match self.providers.last() {
            Some(provider) => Arc::clone(provider),
            None => Arc::new(DisabledEmbedder),
        };
        RetrievalIndex::empty(provider)
    }
}

impl From<Arc<dyn EmbeddingProvider>> for ProviderChain {
    fn from(primary: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(primary)
    }
}
