//! Example queries for the dashboard
//!
//! Single-statement examples come from a JSON file shaped like
//! `{"test_queries": [{"name", "query", "description"}]}`. Query-chain
//! examples are built in and always appended.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleQuery {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub description: String,
}

impl ExampleQuery {
    fn new(name: &str, query: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            query: query.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ExamplesFile {
    #[serde(default)]
    test_queries: Vec<ExampleQuery>,
}

/// File examples followed by the built-in chains
///
/// A missing or unreadable file logs an error and contributes nothing.
pub fn load_examples(path: Option<&Path>) -> Vec<ExampleQuery> {
    let mut examples = path.map(read_examples_file).unwrap_or_default();
    examples.extend(chain_examples());
    examples
}

fn read_examples_file(path: &Path) -> Vec<ExampleQuery> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "failed to read example queries");
            return Vec::new();
        }
    };
    match serde_json::from_str::<ExamplesFile>(&content) {
        Ok(file) => {
            tracing::debug!(path = ?path, count = file.test_queries.len(), "loaded example queries");
            file.test_queries
        }
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "failed to parse example queries");
            Vec::new()
        }
    }
}

pub fn chain_examples() -> Vec<ExampleQuery> {
    vec![
        ExampleQuery::new(
            "Chain: user analysis",
            "SELECT * FROM users WHERE email = 'john@example.com';\n\
             SELECT COUNT(*) AS order_count FROM orders\n\
             WHERE user_id = (SELECT id FROM users WHERE email = 'john@example.com');\n\
             SELECT o.total_amount, oi.product_name FROM orders o\n\
             JOIN order_items oi ON o.id = oi.order_id\n\
             WHERE o.user_id = (SELECT id FROM users WHERE email = 'john@example.com')\n\
             ORDER BY o.created_at DESC;",
            "Query chain that analyzes one user",
        ),
        ExampleQuery::new(
            "Chain: sales report",
            "SELECT DATE(created_at) AS date, COUNT(*) AS orders_count, SUM(total_amount) AS total_revenue\n\
             FROM orders\n\
             WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'\n\
             GROUP BY DATE(created_at)\n\
             ORDER BY date;\n\
             SELECT u.name, COUNT(o.id) AS user_orders, SUM(o.total_amount) AS user_spent\n\
             FROM users u\n\
             LEFT JOIN orders o ON u.id = o.user_id\n\
             WHERE o.created_at >= CURRENT_DATE - INTERVAL '7 days' OR o.created_at IS NULL\n\
             GROUP BY u.id, u.name\n\
             HAVING COUNT(o.id) > 0\n\
             ORDER BY user_spent DESC\n\
             LIMIT 10;",
            "Query chain for a weekly sales report",
        ),
        ExampleQuery::new(
            "Chain: table statistics",
            "SELECT schemaname, tablename, attname, n_distinct, correlation\n\
             FROM pg_stats\n\
             WHERE tablename IN ('users', 'orders', 'order_items')\n\
             ORDER BY tablename, attname;\n\
             SELECT indexname, tablename, indexdef\n\
             FROM pg_indexes\n\
             WHERE schemaname = 'public'\n\
             AND tablename IN ('users', 'orders', 'order_items');\n\
             SELECT relname, n_tup_ins, n_tup_upd, n_tup_del, n_live_tup, n_dead_tup\n\
             FROM pg_stat_user_tables\n\
             WHERE relname IN ('users', 'orders', 'order_items');",
            "Query chain over table and index statistics",
        ),
    ]
}
