//! Tests for prompt construction

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn plan() -> Value {
    json!({
        "Node Type": "Hash Join",
        "Total Cost": 120.75,
        "Hash Cond": "(o.user_id = u.id)",
        "Plans": [{"Node Type": "Seq Scan", "Relation Name": "orders"}]
    })
}

#[test]
fn test_context_from_plan() {
    let context = AnalysisContext::new("SELECT * FROM orders o JOIN users u ON o.user_id = u.id", &plan());
    assert_eq!(context.total_cost, 120.75);
    assert_eq!(context.execution_time, 0.0);
    assert_eq!(context.rows, 0.0);
    assert_eq!(context.plan_nodes.len(), 2);
    assert_eq!(context.plan_nodes[1].relation_name, "orders");
}

#[test]
fn test_single_query_prompt() {
    let context = AnalysisContext::new("SELECT 1", &plan());
    let prompt = analysis_prompt(&context);

    assert!(prompt.contains("SQL QUERY:\nSELECT 1"));
    assert!(!prompt.contains("QUERY CHAIN"));
    assert!(prompt.contains("- Total cost: 120.75"));
    assert!(prompt.contains("\"relation_name\": \"orders\""));
    assert!(prompt.contains("\"condition\": \"(o.user_id = u.id)\""));
    assert!(prompt.contains("\"estimated_speedup\""));
}

#[test]
fn test_chain_prompt_mentions_chain() {
    let context = AnalysisContext::new("SELECT 1; SELECT 2;", &plan());
    let prompt = analysis_prompt(&context);

    assert!(prompt.contains("SQL QUERY CHAIN (2 queries)"));
    assert!(prompt.contains("duplicated work across the chain"));
}

#[test]
fn test_analysis_request_shape() {
    let request = analysis_request(&AnalysisContext::new("SELECT 1", &plan()));
    let roles: Vec<_> = request.messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["system", "user"]);
    assert_eq!(request.temperature, Some(ANALYSIS_TEMPERATURE));
    assert_eq!(request.max_tokens, None);

    assert_eq!(connection_test_request().max_tokens, Some(1));
}
