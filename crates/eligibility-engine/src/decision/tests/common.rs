use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::audit::InMemoryAuditSink;
use crate::decision::{decision_router, DecisionService};
use crate::evaluation::EvaluationContext;
use crate::retrieval::{DisabledEmbedder, EmbeddingProvider, RetrievalError};
use crate::rules::{InMemoryRuleSource, RuleSource, SourceError};

pub(super) const HOUSING: &str = include_str!("../../../../../rules/housing_assistance.json");

/// Maps every text to the same vector, so each clause matches any query fully.
pub(super) struct UniformEmbedder;

impl EmbeddingProvider for UniformEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
        Ok(vec![1.0])
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "uniform"
    }
}

pub(super) struct UnreachableSource;

impl RuleSource for UnreachableSource {
    fn fetch(&self, _ruleset_id: &str) -> Result<Option<String>, SourceError> {
        Err(SourceError::Unavailable("rules bucket offline".to_string()))
    }
}

pub(super) type MemoryService = DecisionService<InMemoryRuleSource, InMemoryAuditSink>;

pub(super) fn source() -> Arc<InMemoryRuleSource> {
    Arc::new(
        InMemoryRuleSource::new()
            .with_document("housing", HOUSING)
            .with_document("empty", "[]")
            .with_document("broken", r#"[{ "id": "R1" }]"#),
    )
}

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryRuleSource>, Arc<InMemoryAuditSink>) {
    build_service_with(Arc::new(UniformEmbedder))
}

pub(super) fn build_service_with(
    embedder: Arc<dyn EmbeddingProvider>,
) -> (MemoryService, Arc<InMemoryRuleSource>, Arc<InMemoryAuditSink>) {
    let source = source();
    let audit = Arc::new(InMemoryAuditSink::new());
    let service = DecisionService::new(source.clone(), audit.clone(), embedder);
    (service, source, audit)
}

pub(super) fn disabled_service() -> MemoryService {
    build_service_with(Arc::new(DisabledEmbedder)).0
}

pub(super) fn qualifying_applicant() -> EvaluationContext {
    EvaluationContext::new()
        .with("income", 500000)
        .with("resident", true)
        .with("age", 34)
        .with("category", "EWS")
}

pub(super) fn decision_router_with_service(service: MemoryService) -> axum::Router {
    decision_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
