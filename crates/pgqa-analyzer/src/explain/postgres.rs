//! PostgreSQL EXPLAIN normalizer
//!
//! Turns `EXPLAIN (FORMAT JSON)` output into a [`PlanNode`] tree. The
//! normalizer never fails on a structurally odd document: anything it cannot
//! classify ends up as an `Unknown` node or as a plain attribute.
//!
//! # Examples
//!
//! ```
//! use pgqa_analyzer::explain::postgres::parse_json_explain;
//!
//! let json_output = r#"[
//!   {
//!     "Plan": {
//!       "Node Type": "Seq Scan",
//!       "Relation Name": "users",
//!       "Startup Cost": 0.0,
//!       "Total Cost": 10.0,
//!       "Plan Rows": 100,
//!       "Plan Width": 36
//!     }
//!   }
//! ]"#;
//!
//! let root = parse_json_explain(json_output).unwrap();
//! assert_eq!(root.node_type, "Seq Scan");
//! assert_eq!(root.text_attribute("Relation Name"), Some("users"));
//! ```

use pgqa_core::AnalysisResult;
use serde_json::Value;
use thiserror::Error;

use crate::explain::plan::{AttributeValue, PlanNode, UNKNOWN_NODE_TYPE};

pub const NODE_TYPE: &str = "Node Type";
pub const STARTUP_COST: &str = "Startup Cost";
pub const TOTAL_COST: &str = "Total Cost";
pub const PLAN_ROWS: &str = "Plan Rows";
pub const PLAN_WIDTH: &str = "Plan Width";
/// Child list, consumed by recursion and never shown as a field
pub const PLANS: &str = "Plans";
/// Holds a `Node Type` value that was not a string
pub const RAW_NODE_TYPE: &str = "Raw Node Type";

/// Errors that can occur when parsing EXPLAIN text
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("EXPLAIN output contains no plan")]
    EmptyDocument,
}

pub type Result<T> = std::result::Result<T, PlanParseError>;

/// Parses the text of `EXPLAIN (FORMAT JSON)` output.
///
/// Accepts the array PostgreSQL returns (`[{"Plan": {...}}]`), a single
/// `{"Plan": {...}}` object, or a bare root node.
pub fn parse_json_explain(json: &str) -> Result<PlanNode> {
    let value: Value = serde_json::from_str(json.trim())?;
    let root = locate_root(&value).ok_or(PlanParseError::EmptyDocument)?;
    Ok(normalize_plan(root))
}

/// Builds the plan tree stored in an analysis result.
///
/// Returns `None` when the result carries no plan object.
pub fn plan_tree(result: &AnalysisResult) -> Option<PlanNode> {
    if !result.has_plan() {
        return None;
    }
    locate_root(&result.execution_plan.plan_json).map(normalize_plan)
}

/// Finds the root plan node inside any of the accepted document shapes
fn locate_root(value: &Value) -> Option<&Value> {
    let statement = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    Some(statement.get("Plan").unwrap_or(statement))
}

/// Normalizes one plan node object and its `Plans` subtree.
///
/// - a missing or non-string `Node Type` yields `"Unknown"`; a non-string
///   value is kept as the `Raw Node Type` attribute
/// - typed fields of the wrong JSON kind are kept as attributes
/// - null values are skipped
/// - non-object input yields an empty `Unknown` node
pub fn normalize_plan(value: &Value) -> PlanNode {
    let Some(object) = value.as_object() else {
        tracing::debug!(kind = json_kind(value), "plan node is not an object");
        return PlanNode::unknown();
    };

    let node_type = object
        .get(NODE_TYPE)
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_NODE_TYPE);
    let mut node = PlanNode::new(node_type);

    for (key, val) in object {
        if val.is_null() {
            continue;
        }

        let kept_as_typed = match key.as_str() {
            NODE_TYPE => {
                if !val.is_string() {
                    node.attributes
                        .insert(RAW_NODE_TYPE.to_string(), AttributeValue::from(val));
                }
                true
            }
            PLANS => {
                match val.as_array() {
                    Some(plans) => node.children = plans.iter().map(normalize_plan).collect(),
                    None => tracing::debug!(kind = json_kind(val), "ignoring non-array Plans"),
                }
                true
            }
            STARTUP_COST => val.as_f64().map(|c| node.startup_cost = Some(c)).is_some(),
            TOTAL_COST => val.as_f64().map(|c| node.total_cost = Some(c)).is_some(),
            PLAN_ROWS => as_count(val).map(|r| node.estimated_rows = Some(r)).is_some(),
            PLAN_WIDTH => as_count(val).map(|w| node.row_width_bytes = Some(w)).is_some(),
            _ => false,
        };

        if !kept_as_typed {
            node.attributes.insert(key.clone(), AttributeValue::from(val));
        }
    }

    node
}

/// Non-negative whole number, including floats like `12.0`
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
