//! Prompt construction for plan analysis

use pgqa_analyzer::{PlanNodeSummary, flatten_plan, normalize_plan};
use pgqa_core::split_statements;
use serde_json::Value;

use crate::provider::{ChatMessage, ChatRequest};

/// Low temperature keeps the JSON answer stable across calls
pub const ANALYSIS_TEMPERATURE: f32 = 0.1;

const SYSTEM_PROMPT: &str = "You are a PostgreSQL performance expert. Analyze SQL queries \
and their execution plans and give concrete, practical recommendations for improving \
performance. Respond ONLY with JSON, without any additional text.";

const RESPONSE_FORMAT: &str = r#"Respond ONLY with JSON in exactly this shape:

{
  "rewritten_query": "optimized version of the query, or null if no rewrite is needed",
  "resource_metrics": {
    "cpu_usage": number from 0 to 100,
    "memory_usage": number in MB,
    "io_operations": integer,
    "disk_reads": integer,
    "disk_writes": integer
  },
  "recommendations": [
    {
      "type": "recommendation category",
      "priority": "high|medium|low",
      "title": "short title",
      "description": "detailed description",
      "potential_improvement": "expected improvement",
      "implementation": "how to implement it",
      "estimated_speedup": number in percent
    }
  ],
  "warnings": ["warning 1", "warning 2"]
}

"rewritten_query" must hold an optimized SQL query when a rewrite improves performance,
for example an implicit comma join turned into an explicit JOIN, a subquery replaced by
a JOIN, an inefficient WHERE clause, or a missing LIMIT on a large result.
Use null if the query is already optimal."#;

/// Everything the model is told about one query
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    pub query: String,
    pub total_cost: f64,
    /// `Actual Total Time` in ms, 0 for plain EXPLAIN
    pub execution_time: f64,
    /// `Actual Rows`, 0 for plain EXPLAIN
    pub rows: f64,
    pub plan_nodes: Vec<PlanNodeSummary>,
}

impl AnalysisContext {
    pub fn new(query: &str, plan_json: &Value) -> Self {
        let root = normalize_plan(plan_json);
        let number = |key: &str| root.attribute(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
        Self {
            query: query.to_string(),
            total_cost: root.total_cost.unwrap_or(0.0),
            execution_time: number("Actual Total Time"),
            rows: number("Actual Rows"),
            plan_nodes: flatten_plan(&root),
        }
    }

    pub fn statements(&self) -> Vec<&str> {
        split_statements(&self.query)
    }
}

/// Builds the user prompt
pub fn analysis_prompt(context: &AnalysisContext) -> String {
    let statement_count = context.statements().len();
    let is_chain = statement_count > 1;

    let mut prompt = String::from("Analyze the following SQL and its execution plan.\n\n");

    if is_chain {
        prompt.push_str(&format!(
            "SQL QUERY CHAIN ({} queries):\n{}\n\n\
             NOTE: this is a chain of {} related queries. Analyze them as one logical \
             sequence and give recommendations for the chain as a whole.\n\n",
            statement_count, context.query, statement_count
        ));
    } else {
        prompt.push_str(&format!("SQL QUERY:\n{}\n\n", context.query));
    }

    let nodes = serde_json::to_string_pretty(&context.plan_nodes).unwrap_or_else(|_| "[]".into());
    prompt.push_str(&format!(
        "EXECUTION PLAN (of the first query):\n\
         - Total cost: {}\n\
         - Execution time: {} ms\n\
         - Rows: {}\n\n\
         PLAN NODES:\n{}\n\n",
        context.total_cost, context.execution_time, context.rows, nodes
    ));

    prompt.push_str(
        "Please analyze:\n\n\
         1. RESOURCE USAGE:\n\
         \x20  - Estimate CPU usage (0-100%)\n\
         \x20  - Estimate memory usage in MB\n\
         \x20  - Count I/O operations\n\
         \x20  - Estimate disk reads and writes\n\n\
         2. OPTIMIZATION RECOMMENDATIONS:\n\
         \x20  - Suggest concrete improvements with a priority (high/medium/low)\n\
         \x20  - Cover indexes, query rewrites and database configuration\n\
         \x20  - Estimate the speedup of each recommendation\n\
         \x20  - Give concrete implementation steps\n",
    );
    if is_chain {
        prompt.push_str("   - Take the relationships between the queries in the chain into account\n");
    }

    prompt.push_str(
        "\n3. WARNINGS:\n\
         \x20  - Point out potentially dangerous operations\n\
         \x20  - Point out performance problems\n\
         \x20  - Point out possible locking issues\n",
    );
    if is_chain {
        prompt.push_str("   - Look for duplicated work across the chain\n");
    }

    prompt.push_str("\nBe specific and practical. Focus on real performance improvements.\n\n");
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

/// Full chat request for analyzing one query
pub fn analysis_request(context: &AnalysisContext) -> ChatRequest {
    ChatRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(analysis_prompt(context)),
    ])
    .with_temperature(ANALYSIS_TEMPERATURE)
}

/// Smallest possible request, used to check credentials and reachability
pub fn connection_test_request() -> ChatRequest {
    ChatRequest::new(vec![ChatMessage::user("Test")]).with_max_tokens(1)
}

#[cfg(test)]
mod tests;
