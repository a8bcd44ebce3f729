//! `PlanExplainer` backed by a PostgreSQL server

use std::time::Duration;

use async_trait::async_trait;
use pgqa_core::{DatabaseInfo, PlanExplainer, sanitize_db_url_for_logging};
use serde_json::{Map, Value, json};
use tokio_postgres::{Client, Config, SimpleQueryMessage};

use crate::connection::{connect, format_postgres_error, parse_config};
use crate::error::{PostgresError, Result};
use crate::rewrite::{QueryKind, dml_table_name, dml_to_select, statement_preview};

const EXPLAIN_PREFIX: &str = "EXPLAIN (ANALYZE false, BUFFERS false, FORMAT JSON)";

const DATABASE_INFO_QUERY: &str = "SELECT version(), \
    pg_size_pretty(pg_database_size(current_database())), \
    (SELECT count(*) FROM information_schema.tables WHERE table_schema = 'public'), \
    (SELECT count(*) FROM pg_indexes WHERE schemaname = 'public')";

/// Explains queries against one database URL
pub struct PostgresExplainer {
    url: String,
    config: Config,
}

impl PostgresExplainer {
    /// Validates the URL syntax; no connection is made until the first call
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            config: parse_config(url, connect_timeout)?,
        })
    }

    async fn client(&self) -> Result<Client> {
        connect(&self.config, &self.url).await
    }

    /// Runs `EXPLAIN (FORMAT JSON)` and returns the root plan object
    async fn run_explain(&self, client: &Client, query: &str, kind: QueryKind) -> Result<Value> {
        let sql = format!("{} {}", EXPLAIN_PREFIX, query);
        let messages = client
            .simple_query(&sql)
            .await
            .map_err(|e| PostgresError::Explain(format_postgres_error(&e)))?;

        let text = messages
            .iter()
            .find_map(|m| match m {
                SimpleQueryMessage::Row(row) => row.try_get(0).ok().flatten(),
                _ => None,
            })
            .ok_or(PostgresError::NoPlan)?;

        let document: Value = serde_json::from_str(text)?;
        Ok(root_plan(document, kind))
    }

    /// Explains a DML statement through its SELECT rewrite
    async fn explain_dml(&self, client: &Client, query: &str, kind: QueryKind) -> Value {
        let converted = dml_to_select(query);
        if let Some(select) = &converted {
            tracing::info!(query_type = %kind, converted = %select, "explaining SELECT equivalent of DML");
        }
        let target = converted.as_deref().unwrap_or(query);

        match self.run_explain(client, target, kind).await {
            Ok(plan) => match converted {
                Some(select) => annotate_conversion(plan, kind, query, &select),
                None => plan,
            },
            Err(e) => {
                tracing::warn!(query_type = %kind, error = %e, "EXPLAIN failed for DML, using placeholder plan");
                dml_placeholder_plan(kind, query)
            }
        }
    }
}

#[async_trait]
impl PlanExplainer for PostgresExplainer {
    #[tracing::instrument(skip(self, query), fields(database = %self.target(), query_len = query.len()))]
    async fn explain(&self, query: &str) -> pgqa_core::Result<Value> {
        let kind = QueryKind::classify(query);
        if !(kind == QueryKind::Select || kind.is_dml()) {
            tracing::debug!(query_type = %kind, "utility statement, skipping EXPLAIN");
            return Ok(utility_plan(kind));
        }

        let client = self.client().await?;
        let plan = if kind.is_dml() {
            self.explain_dml(&client, query, kind).await
        } else {
            self.run_explain(&client, query, kind).await?
        };
        Ok(plan)
    }

    async fn test_connection(&self) -> bool {
        let client = match self.client().await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "database connection test failed");
                return false;
            }
        };
        match client.simple_query("SELECT 1").await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %format_postgres_error(&e), "database connection test failed");
                false
            }
        }
    }

    #[tracing::instrument(skip(self), fields(database = %self.target()))]
    async fn database_info(&self) -> pgqa_core::Result<DatabaseInfo> {
        let client = self.client().await?;
        let info_error = |e: tokio_postgres::Error| PostgresError::Info(format_postgres_error(&e));
        let row = client
            .query_one(DATABASE_INFO_QUERY, &[])
            .await
            .map_err(info_error)?;

        let info = DatabaseInfo {
            version: row.try_get(0).map_err(info_error)?,
            database_size: row.try_get(1).map_err(info_error)?,
            table_count: row.try_get(2).map_err(info_error)?,
            index_count: row.try_get(3).map_err(info_error)?,
        };
        tracing::debug!(tables = info.table_count, indexes = info.index_count, "database info loaded");
        Ok(info)
    }

    fn target(&self) -> String {
        sanitize_db_url_for_logging(&self.url)
    }
}

/// Picks the root plan out of an EXPLAIN document and stamps `Query Type`.
///
/// An empty or non-object document yields an `Unknown` placeholder.
pub(crate) fn root_plan(document: Value, kind: QueryKind) -> Value {
    let statement = match document {
        Value::Array(items) => items.into_iter().next(),
        other => Some(other),
    };

    let plan = match statement {
        Some(Value::Object(mut object)) => match object.remove("Plan") {
            Some(Value::Object(plan)) => Some(plan),
            _ => Some(object),
        },
        _ => None,
    };

    match plan {
        Some(mut plan) => {
            plan.insert("Query Type".into(), json!(kind.as_str()));
            Value::Object(plan)
        }
        None => {
            tracing::warn!(query_type = %kind, "EXPLAIN returned no plan object");
            placeholder("Unknown", kind, format!("Query type: {}", kind))
        }
    }
}

/// Records that the plan belongs to a rewritten DML statement
pub(crate) fn annotate_conversion(mut plan: Value, kind: QueryKind, original: &str, select: &str) -> Value {
    if let Value::Object(object) = &mut plan {
        object.insert("Original Query Type".into(), json!(kind.as_str()));
        object.insert("Converted From".into(), json!(statement_preview(original)));
        object.insert("Converted Query".into(), json!(select));
        object.insert(
            "Note".into(),
            json!(format!("Plan generated from SELECT equivalent of {} query", kind)),
        );
    }
    plan
}

/// Plan returned for a DML statement that could not be explained at all
pub(crate) fn dml_placeholder_plan(kind: QueryKind, query: &str) -> Value {
    let table = dml_table_name(query);
    let mut object = Map::new();
    object.insert("Node Type".into(), json!(kind.as_str()));
    object.insert("Total Cost".into(), json!(1.0));
    object.insert("Plan Rows".into(), json!(1));
    object.insert("Plan Width".into(), json!(0));
    object.insert("Query Type".into(), json!(kind.as_str()));
    object.insert("Relation Name".into(), json!(table));
    object.insert("Description".into(), json!(format!("DML operation on table: {}", table)));
    object.insert(
        "Note".into(),
        json!("Plan generated without EXPLAIN due to read-only permissions"),
    );
    Value::Object(object)
}

/// Plan returned for statements that are not explained (DDL and others)
pub(crate) fn utility_plan(kind: QueryKind) -> Value {
    placeholder("Utility", kind, format!("Utility command: {}", kind))
}

fn placeholder(node_type: &str, kind: QueryKind, description: String) -> Value {
    let mut object = Map::new();
    object.insert("Node Type".into(), json!(node_type));
    object.insert("Total Cost".into(), json!(0));
    object.insert("Plan Rows".into(), json!(0));
    object.insert("Plan Width".into(), json!(0));
    object.insert("Query Type".into(), json!(kind.as_str()));
    object.insert("Description".into(), json!(description));
    Value::Object(object)
}
