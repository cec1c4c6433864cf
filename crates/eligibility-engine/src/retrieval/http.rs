//! Sentence embeddings served over HTTP by an Ollama-compatible endpoint.
//!
//! Calls block the current thread on a private runtime, so they must run on
//! a blocking thread rather than inside an async task.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{EmbeddingProvider, RetrievalError};

pub const DEFAULT_EMBEDDING_ENDPOINT: &str = "http://localhost:11434";

/// `all-MiniLM-L6-v2`, which yields 384-dimensional sentence vectors.
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Semantic embedding provider backed by `POST {endpoint}/api/embed`.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    endpoint: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions: dimensions.max(1),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn failure(&self, reason: impl Into<String>) -> RetrievalError {
        RetrievalError::Provider {
            provider: self.model.clone(),
            reason: reason.into(),
        }
    }

    fn request_embedding(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let url = format!("{}/api/embed", self.endpoint);
        let request = EmbedRequest {
            model: &self.model,
            input: vec![text],
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| self.failure(format!("runtime error: {err}")))?;

        let response: EmbedResponse = runtime.block_on(async {
            let client = reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|err| self.failure(format!("client error: {err}")))?;
            let response = client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|err| self.failure(format!("http error: {err}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(self.failure(format!("endpoint returned {status}: {body}")));
            }

            response
                .json()
                .await
                .map_err(|err| self.failure(format!("malformed response: {err}")))
        })?;

        let mut embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| self.failure("empty response"))?;
        if embedding.len() != self.dimensions {
            debug!(
                model = %self.model,
                returned = embedding.len(),
                expected = self.dimensions,
                "resizing embedding"
            );
            embedding.resize(self.dimensions, 0.0);
        }

        normalise(&mut embedding);
        Ok(embedding)
    }
}

fn normalise(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        self.request_embedding(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}
