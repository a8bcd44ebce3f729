use axum::{Json, extract::State};
use pgqa_analyzer::{DisplayNode, NodeId, PlanTreeState, node_ids, parse_json_explain, render_tree};
use pgqa_core::{AnalysisRequest, AnalysisResult, DatabaseInfo, HealthCheck};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{error::HttpError, state::AppState};
use crate::example_queries::load_examples;
use crate::service::{DatabaseTestRequest, DatabaseTestResponse};

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": state.app_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthCheck> {
    Json(state.service.health().await)
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, HttpError> {
    let result = state.service.analyze(&request).await?;
    Ok(Json(result))
}

/// Display tree for a raw EXPLAIN document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTreeResponse {
    pub root: DisplayNode,
    /// Pre-order ids, the input to expand-all
    pub node_ids: Vec<NodeId>,
    pub node_count: usize,
    /// Fully expanded text rendering without details
    pub text: String,
}

impl PlanTreeResponse {
    fn new(root: DisplayNode) -> Self {
        let mut tree_state = PlanTreeState::new();
        tree_state.expand_all(&root);
        let ids = node_ids(&root);
        Self {
            text: render_tree(&root, &tree_state),
            node_count: ids.len(),
            node_ids: ids,
            root,
        }
    }
}

pub async fn plan_tree(body: String) -> Result<Json<PlanTreeResponse>, HttpError> {
    let plan = parse_json_explain(&body)
        .map_err(|e| HttpError::BadRequest(format!("Invalid EXPLAIN document: {}", e)))?;
    Ok(Json(PlanTreeResponse::new(DisplayNode::from_plan(&plan))))
}

pub async fn examples(State(state): State<AppState>) -> Json<Value> {
    let examples = load_examples(state.examples_file.as_deref());
    Json(json!({ "examples": examples }))
}

pub async fn database_info(
    State(state): State<AppState>,
) -> Result<Json<DatabaseInfo>, HttpError> {
    Ok(Json(state.service.database_info().await?))
}

pub async fn test_database(
    State(state): State<AppState>,
    Json(request): Json<DatabaseTestRequest>,
) -> Json<DatabaseTestResponse> {
    Json(state.service.test_database(&request).await)
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "cache_stats": state.service.llm().cache_stats(),
    }))
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<Value> {
    state.service.llm().clear_cache();
    Json(json!({
        "status": "success",
        "message": "Cache cleared successfully",
    }))
}
