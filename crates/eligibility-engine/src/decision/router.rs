use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task;

use super::domain::{Decision, DecisionRequest};
use super::service::DecisionService;
use crate::audit::AuditSink;
use crate::error::AppError;
use crate::rules::RuleSource;

/// Router exposing decision evaluation and ruleset inspection.
pub fn decision_router<S, A>(service: Arc<DecisionService<S, A>>) -> Router
where
    S: RuleSource + 'static,
    A: AuditSink + 'static,
{
    Router::new()
        .route("/api/v1/decisions", post(evaluate_handler::<S, A>))
        .route(
            "/api/v1/rulesets/:ruleset_id",
            get(ruleset_handler::<S, A>),
        )
        .with_state(service)
}

/// Runs on the blocking pool: loading, embedding and audit writes block.
pub(crate) async fn evaluate_handler<S, A>(
    State(service): State<Arc<DecisionService<S, A>>>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<Decision>, AppError>
where
    S: RuleSource + 'static,
    A: AuditSink + 'static,
{
    let decision = task::spawn_blocking(move || service.evaluate(&request)).await??;
    Ok(Json(decision))
}

pub(crate) async fn ruleset_handler<S, A>(
    State(service): State<Arc<DecisionService<S, A>>>,
    Path(ruleset_id): Path<String>,
) -> Result<Json<Value>, AppError>
where
    S: RuleSource + 'static,
    A: AuditSink + 'static,
{
    let ruleset = task::spawn_blocking(move || service.rules(&ruleset_id)).await??;
    Ok(Json(json!({
        "ruleset_id": ruleset.id,
        "fingerprint": ruleset.fingerprint,
        "rules": ruleset.rules,
    })))
}
