//! Plan summaries
//!
//! Condenses a plan tree into the headline numbers stored in an
//! [`ExecutionPlanSummary`] and into the flat node list sent to the LLM.

use pgqa_core::ExecutionPlanSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::explain::plan::PlanNode;
use crate::explain::postgres::normalize_plan;

/// Node type fragments counted as I/O performing operations
const IO_NODE_MARKERS: &[&str] = &[
    "Seq Scan",
    "Index Scan",
    "Index Only Scan",
    "Bitmap",
    "Sort",
    "Hash",
];

/// One plan node flattened for the LLM prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNodeSummary {
    pub level: usize,
    pub node_type: String,
    pub cost: f64,
    pub rows: u64,
    pub width: u64,
    pub relation_name: String,
    pub index_name: String,
    pub join_type: String,
    /// `Hash Cond`, or `Index Cond` when there is none
    pub condition: String,
}

/// Flattens the tree in pre-order, recording each node's depth
pub fn flatten_plan(root: &PlanNode) -> Vec<PlanNodeSummary> {
    let mut nodes = Vec::with_capacity(root.node_count());
    flatten_into(root, 0, &mut nodes);
    nodes
}

fn flatten_into(node: &PlanNode, level: usize, out: &mut Vec<PlanNodeSummary>) {
    let text = |key: &str| node.text_attribute(key).unwrap_or_default().to_string();
    let condition = node
        .text_attribute("Hash Cond")
        .filter(|c| !c.is_empty())
        .or_else(|| node.text_attribute("Index Cond"))
        .unwrap_or_default()
        .to_string();

    out.push(PlanNodeSummary {
        level,
        node_type: node.node_type.clone(),
        cost: node.total_cost.unwrap_or(0.0),
        rows: node.estimated_rows.unwrap_or(0),
        width: node.row_width_bytes.unwrap_or(0),
        relation_name: text("Relation Name"),
        index_name: text("Index Name"),
        join_type: text("Join Type"),
        condition,
    });

    for child in &node.children {
        flatten_into(child, level + 1, out);
    }
}

/// Counts scan, sort and hash nodes as a rough I/O figure
pub fn count_io_operations(root: &PlanNode) -> u64 {
    root.iter()
        .filter(|n| IO_NODE_MARKERS.iter().any(|m| n.node_type.contains(m)))
        .count() as u64
}

/// Builds the headline summary for a root plan object.
///
/// `Actual Total Time` is only present for EXPLAIN ANALYZE and is 0
/// otherwise. Rows prefer `Actual Rows` and fall back to the planner estimate.
pub fn summarize_execution_plan(plan_json: Value) -> ExecutionPlanSummary {
    let root = normalize_plan(&plan_json);
    let number = |key: &str| root.attribute(key).and_then(|v| v.as_f64());

    let rows = number("Actual Rows")
        .map(|r| r.max(0.0) as u64)
        .or(root.estimated_rows)
        .unwrap_or(0);

    ExecutionPlanSummary {
        total_cost: root.total_cost.unwrap_or(0.0),
        execution_time: number("Actual Total Time").unwrap_or(0.0),
        rows,
        width: root.row_width_bytes.unwrap_or(0),
        io_operations: count_io_operations(&root),
        plan_json,
    }
}
