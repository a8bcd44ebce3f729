//! The seam between the analysis pipeline and whatever produces EXPLAIN plans.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Produces a PostgreSQL `EXPLAIN (FORMAT JSON)` root plan object for a query.
///
/// Implementations return the plan node itself (the object that PostgreSQL
/// nests under `"Plan"`), not the surrounding array.
#[async_trait]
pub trait PlanExplainer: Send + Sync {
    /// Explain a single SQL statement without executing it.
    async fn explain(&self, query: &str) -> Result<Value>;

    /// Returns true if the target database is reachable.
    async fn test_connection(&self) -> bool;

    /// Server version and size figures of the target database.
    async fn database_info(&self) -> Result<DatabaseInfo>;

    /// Short, password-free description of the target for logs.
    fn target(&self) -> String;
}

/// Overview of the target database for `GET /database/info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Output of `SELECT version()`
    pub version: String,
    /// Human-readable size, as printed by `pg_size_pretty`
    pub database_size: String,
    /// Tables in the `public` schema
    pub table_count: i64,
    /// Indexes in the `public` schema
    pub index_count: i64,
}
