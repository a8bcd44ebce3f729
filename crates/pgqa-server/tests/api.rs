//! HTTP API tests against a scripted explainer and LLM provider

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use pgqa_core::{DatabaseInfo, PgqaError, PlanExplainer};
use pgqa_llm::{ChatRequest, LlmAnalyzer, LlmError, LlmProvider, ProviderMetadata};
use pgqa_server::{
    AnalysisService, AppState, ExplainerFactory, PlanTreeResponse, ServiceConfig, create_router,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

const EXPLAIN_DOCUMENT: &str = r#"[{
  "Plan": {
    "Node Type": "Hash Join",
    "Join Type": "Inner",
    "Startup Cost": 1.09,
    "Total Cost": 2.26,
    "Plan Rows": 5,
    "Plan Width": 68,
    "Hash Cond": "(o.user_id = u.id)",
    "Plans": [
      {"Node Type": "Seq Scan", "Relation Name": "orders", "Alias": "o",
       "Startup Cost": 0.0, "Total Cost": 1.05, "Plan Rows": 5, "Plan Width": 36},
      {"Node Type": "Hash", "Startup Cost": 1.04, "Total Cost": 1.04, "Plan Rows": 4, "Plan Width": 36,
       "Plans": [
         {"Node Type": "Seq Scan", "Relation Name": "users", "Alias": "u",
          "Startup Cost": 0.0, "Total Cost": 1.04, "Plan Rows": 4, "Plan Width": 36}
       ]}
    ]
  }
}]"#;

const ANSWER: &str = r#"```json
{
  "rewritten_query": "SELECT o.id, u.name FROM orders o JOIN users u ON o.user_id = u.id",
  "resource_metrics": {"cpu_usage": 15, "memory_usage": 4, "io_operations": 3, "disk_reads": 2, "disk_writes": 0},
  "recommendations": [
    {"type": "index", "priority": "medium", "title": "Index orders.user_id",
     "description": "Join key without an index", "implementation": "CREATE INDEX ON orders (user_id)",
     "estimated_speedup": 20}
  ],
  "warnings": []
}
```"#;

struct StaticExplainer {
    plan: Option<Value>,
}

#[async_trait]
impl PlanExplainer for StaticExplainer {
    async fn explain(&self, _query: &str) -> pgqa_core::Result<Value> {
        self.plan
            .clone()
            .ok_or_else(|| PgqaError::Connection("connection refused".to_string()))
    }

    async fn test_connection(&self) -> bool {
        self.plan.is_some()
    }

    async fn database_info(&self) -> pgqa_core::Result<DatabaseInfo> {
        match self.plan {
            Some(_) => Ok(DatabaseInfo {
                version: "PostgreSQL 16.2 on x86_64-pc-linux-gnu".to_string(),
                database_size: "7901 kB".to_string(),
                table_count: 2,
                index_count: 3,
            }),
            None => Err(PgqaError::Connection("connection refused".to_string())),
        }
    }

    fn target(&self) -> String {
        "static".to_string()
    }
}

struct StaticFactory;

impl ExplainerFactory for StaticFactory {
    fn create(&self, _database_url: &str) -> pgqa_core::Result<Arc<dyn PlanExplainer>> {
        Ok(Arc::new(StaticExplainer { plan: Some(root_plan()) }))
    }
}

struct StaticProvider(&'static str);

#[async_trait]
impl LlmProvider for StaticProvider {
    async fn complete(&self, _request: ChatRequest) -> pgqa_llm::Result<String> {
        Ok(self.0.to_string())
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "Static".to_string(),
            model: "static".to_string(),
            endpoint: None,
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

struct DownProvider;

#[async_trait]
impl LlmProvider for DownProvider {
    async fn complete(&self, _request: ChatRequest) -> pgqa_llm::Result<String> {
        Err(LlmError::Timeout)
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "Down".to_string(),
            model: "down".to_string(),
            endpoint: None,
        }
    }

    fn is_available(&self) -> bool {
        false
    }
}

fn root_plan() -> Value {
    let document: Value = serde_json::from_str(EXPLAIN_DOCUMENT).expect("valid document");
    document[0]["Plan"].clone()
}

fn app_with(explainer: StaticExplainer, provider: Arc<dyn LlmProvider>) -> Router {
    let service = AnalysisService::new(
        ServiceConfig {
            max_query_length: 1000,
            enable_sql_security_check: true,
            analysis_timeout: Duration::from_secs(5),
        },
        Arc::new(explainer),
        Arc::new(StaticFactory),
        Arc::new(LlmAnalyzer::new(provider)),
    );
    let state = AppState::new(Arc::new(service), "PostgreSQL Query Analyzer");
    create_router(state, &["http://localhost:3000".to_string()])
}

fn app() -> Router {
    app_with(
        StaticExplainer { plan: Some(root_plan()) },
        Arc::new(StaticProvider(ANSWER)),
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn test_root_reports_name_and_version() {
    let (status, body) = send(app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("PostgreSQL Query Analyzer"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn test_analyze_returns_result() {
    let (status, body) = send(
        app(),
        post_json("/analyze", json!({"query": "SELECT o.id, u.name FROM orders o, users u WHERE o.user_id = u.id"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["execution_plan"]["total_cost"], json!(2.26));
    assert_eq!(body["execution_plan"]["rows"], json!(5));
    assert_eq!(body["execution_plan"]["plan_json"]["Node Type"], json!("Hash Join"));
    assert_eq!(body["recommendations"][0]["type"], json!("index"));
    assert_eq!(body["recommendations"][0]["priority"], json!("medium"));
    assert_eq!(
        body["rewritten_query"],
        json!("SELECT o.id, u.name FROM orders o JOIN users u ON o.user_id = u.id")
    );
    assert!(body["analysis_timestamp"].is_string());
}

#[tokio::test]
async fn test_analyze_validation_is_bad_request() {
    let (status, body) = send(app(), post_json("/analyze", json!({"query": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Query cannot be empty"}));

    let (status, body) = send(app(), post_json("/analyze", json!({"query": "DROP TABLE users"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        json!("Security check failed: Command 'DROP' is not allowed for security reasons")
    );

    let (status, body) = send(
        app(),
        post_json(
            "/analyze",
            json!({"query": "SELECT 1", "database_url": "mysql://root@localhost:5432/app"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        json!("Invalid database URL: Only PostgreSQL connections are allowed")
    );
}

#[tokio::test]
async fn test_analyze_upstream_failure_is_internal_error() {
    let down_db = app_with(StaticExplainer { plan: None }, Arc::new(StaticProvider(ANSWER)));
    let (status, body) = send(down_db, post_json("/analyze", json!({"query": "SELECT 1"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        json!("Analysis failed: Connection error: connection refused")
    );

    let down_llm = app_with(StaticExplainer { plan: Some(root_plan()) }, Arc::new(DownProvider));
    let (status, body) = send(down_llm, post_json("/analyze", json!({"query": "SELECT 1"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], json!("Analysis failed: LLM error: Request timed out"));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));

    let degraded = app_with(StaticExplainer { plan: None }, Arc::new(StaticProvider(ANSWER)));
    let (_, body) = send(degraded, get("/health")).await;
    assert_eq!(body["status"], json!("unhealthy"));
    assert_eq!(body["database_connected"], json!(false));
    assert_eq!(body["llm_available"], json!(true));
}

#[tokio::test]
async fn test_plan_tree() {
    let request = Request::post("/plan/tree")
        .body(Body::from(EXPLAIN_DOCUMENT))
        .expect("request");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);

    let tree: PlanTreeResponse = serde_json::from_value(body).expect("plan tree response");
    assert_eq!(tree.node_count, 4);
    assert_eq!(tree.node_ids.len(), 4);
    assert_eq!(tree.root.node_type, "Hash Join");
    assert_eq!(tree.root.children.len(), 2);
    assert_eq!(
        tree.root.children[0].field("Relation Name").map(|f| f.value.to_string()),
        Some("orders".to_string())
    );
    assert!(tree.text.starts_with("-> Hash Join"));
    assert_eq!(tree.text.lines().count(), 4);
}

#[tokio::test]
async fn test_plan_tree_rejects_invalid_json() {
    let request = Request::post("/plan/tree")
        .body(Body::from("Seq Scan on users"))
        .expect("request");
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["detail"]
            .as_str()
            .expect("detail")
            .starts_with("Invalid EXPLAIN document")
    );
}

#[tokio::test]
async fn test_examples_include_chains() {
    let (status, body) = send(app(), get("/examples")).await;
    assert_eq!(status, StatusCode::OK);
    let examples = body["examples"].as_array().expect("examples");
    assert!(!examples.is_empty());
    assert!(examples.iter().all(|e| e["query"].is_string()));
}

#[tokio::test]
async fn test_cache_stats_and_clear() {
    let app = app();
    let (status, _) = send(app.clone(), post_json("/analyze", json!({"query": "SELECT 1"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(app.clone(), get("/cache/stats")).await;
    assert_eq!(stats["status"], json!("success"));
    assert_eq!(stats["cache_stats"]["cache_size"], json!(1));
    assert_eq!(stats["cache_stats"]["cache_max_size"], json!(100));

    let (status, cleared) = send(app.clone(), post_json("/cache/clear", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["message"], json!("Cache cleared successfully"));

    let (_, stats) = send(app, get("/cache/stats")).await;
    assert_eq!(stats["cache_stats"]["cache_size"], json!(0));
}

#[tokio::test]
async fn test_database_test_endpoint() {
    let (status, body) = send(
        app(),
        post_json(
            "/database/test",
            json!({"host": "localhost", "database": "app", "username": "u", "password": "p"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "success", "message": "Database connection successful"})
    );

    let (_, body) = send(
        app(),
        post_json(
            "/database/test",
            json!({"host": "192.168.1.20", "database": "app", "username": "u", "password": "p"}),
        ),
    )
    .await;
    assert_eq!(body["status"], json!("error"));
    assert_eq!(
        body["message"],
        json!("Invalid connection parameters: Access to private network 192.168.0.0/16 is not allowed")
    );
}

#[tokio::test]
async fn test_database_info() {
    let (status, body) = send(app(), get("/database/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "version": "PostgreSQL 16.2 on x86_64-pc-linux-gnu",
            "database_size": "7901 kB",
            "table_count": 2,
            "index_count": 3
        })
    );

    let down = app_with(StaticExplainer { plan: None }, Arc::new(StaticProvider(ANSWER)));
    let (status, body) = send(down, get("/database/info")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        json!("Failed to get database info: Connection error: connection refused")
    );
}
