//! Query Plan Model - one node of a PostgreSQL execution plan
//!
//! A `PlanNode` keeps the four fields every node is summarised by as typed
//! values and carries every other field PostgreSQL reported in an ordered,
//! open-ended attribute map, so plan fields added by newer server versions
//! are never lost.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node type used when the plan does not name one
pub const UNKNOWN_NODE_TYPE: &str = "Unknown";

/// A single node in the query plan tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanNode {
    /// PostgreSQL operation name, e.g. `"Hash Join"`
    pub node_type: String,
    /// Cost before the first row can be returned
    pub startup_cost: Option<f64>,
    /// Cost to return all rows
    pub total_cost: Option<f64>,
    /// Planner row estimate (`Plan Rows`)
    pub estimated_rows: Option<u64>,
    /// Estimated average row width in bytes (`Plan Width`)
    pub row_width_bytes: Option<u64>,
    /// Every other reported field, in the order PostgreSQL emitted them
    pub attributes: IndexMap<String, AttributeValue>,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Creates a node of the given type with no fields and no children
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            startup_cost: None,
            total_cost: None,
            estimated_rows: None,
            row_width_bytes: None,
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates an `Unknown` node, used for malformed input
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_NODE_TYPE)
    }

    pub fn with_cost(mut self, startup: f64, total: f64) -> Self {
        self.startup_cost = Some(startup);
        self.total_cost = Some(total);
        self
    }

    pub fn with_rows(mut self, rows: u64) -> Self {
        self.estimated_rows = Some(rows);
        self
    }

    pub fn with_width(mut self, width: u64) -> Self {
        self.row_width_bytes = Some(width);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    /// Looks up an attribute by its PostgreSQL key
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Looks up a text attribute, e.g. `Relation Name`
    pub fn text_attribute(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key)? {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Classifies `node_type`
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_postgres_str(&self.node_type)
    }

    pub fn is_unknown(&self) -> bool {
        self.node_type == UNKNOWN_NODE_TYPE
    }

    /// Returns the total number of nodes in this subtree (including self)
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(PlanNode::node_count).sum::<usize>()
    }

    /// Returns the maximum depth of this subtree, a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(PlanNode::depth).max().unwrap_or(0)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_scan(&self) -> bool {
        self.kind().category() == NodeCategory::Scan
    }

    pub fn is_join(&self) -> bool {
        self.kind().category() == NodeCategory::Join
    }

    /// Pre-order iterator over this subtree
    pub fn iter(&self) -> PlanNodeIterator<'_> {
        PlanNodeIterator { stack: vec![self] }
    }
}

/// Value of a plan attribute
///
/// PostgreSQL emits scalars and arrays of scalars for almost every field;
/// `Json` keeps anything else (nested objects) verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<AttributeValue>),
    Json(Value),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl From<&Value> for AttributeValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Flag(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            other => Self::Json(other.clone()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<u64> for AttributeValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Self::Number)
            .unwrap_or(Self::Json(Value::Null))
    }
}

/// Broad family a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Scan,
    Join,
    Aggregate,
    Sort,
    SetOperation,
    Parallel,
    Modify,
    Control,
    Other,
}

/// Known PostgreSQL plan operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    SeqScan,
    IndexScan,
    IndexOnlyScan,
    BitmapIndexScan,
    BitmapHeapScan,
    TidScan,
    SubqueryScan,
    FunctionScan,
    ValuesScan,
    CteScan,
    ForeignScan,
    NestedLoop,
    HashJoin,
    MergeJoin,
    Aggregate,
    WindowAgg,
    Sort,
    IncrementalSort,
    Hash,
    Materialize,
    Memoize,
    Limit,
    Unique,
    Append,
    MergeAppend,
    SetOp,
    RecursiveUnion,
    Gather,
    GatherMerge,
    ModifyTable,
    LockRows,
    Result,
    Unknown,
}

impl NodeKind {
    /// Maps a PostgreSQL `Node Type` string onto a kind
    pub fn from_postgres_str(s: &str) -> Self {
        match s {
            "Seq Scan" | "Parallel Seq Scan" => Self::SeqScan,
            "Index Scan" => Self::IndexScan,
            "Index Only Scan" => Self::IndexOnlyScan,
            "Bitmap Index Scan" => Self::BitmapIndexScan,
            "Bitmap Heap Scan" => Self::BitmapHeapScan,
            "Tid Scan" | "TID Scan" | "Tid Range Scan" => Self::TidScan,
            "Subquery Scan" => Self::SubqueryScan,
            "Function Scan" | "Table Function Scan" => Self::FunctionScan,
            "Values Scan" => Self::ValuesScan,
            "CTE Scan" | "WorkTable Scan" => Self::CteScan,
            "Foreign Scan" | "Custom Scan" => Self::ForeignScan,
            "Nested Loop" => Self::NestedLoop,
            "Hash Join" => Self::HashJoin,
            "Merge Join" => Self::MergeJoin,
            "Aggregate" | "GroupAggregate" | "HashAggregate" | "Group" => Self::Aggregate,
            "WindowAgg" => Self::WindowAgg,
            "Sort" => Self::Sort,
            "Incremental Sort" => Self::IncrementalSort,
            "Hash" => Self::Hash,
            "Materialize" => Self::Materialize,
            "Memoize" => Self::Memoize,
            "Limit" => Self::Limit,
            "Unique" => Self::Unique,
            "Append" => Self::Append,
            "Merge Append" => Self::MergeAppend,
            "SetOp" => Self::SetOp,
            "Recursive Union" => Self::RecursiveUnion,
            "Gather" => Self::Gather,
            "Gather Merge" => Self::GatherMerge,
            "ModifyTable" | "Insert" | "Update" | "Delete" => Self::ModifyTable,
            "LockRows" => Self::LockRows,
            "Result" | "ProjectSet" => Self::Result,
            _ => Self::Unknown,
        }
    }

    pub fn category(&self) -> NodeCategory {
        match self {
            Self::SeqScan
            | Self::IndexScan
            | Self::IndexOnlyScan
            | Self::BitmapIndexScan
            | Self::BitmapHeapScan
            | Self::TidScan
            | Self::SubqueryScan
            | Self::FunctionScan
            | Self::ValuesScan
            | Self::CteScan
            | Self::ForeignScan => NodeCategory::Scan,
            Self::NestedLoop | Self::HashJoin | Self::MergeJoin => NodeCategory::Join,
            Self::Aggregate | Self::WindowAgg => NodeCategory::Aggregate,
            Self::Sort | Self::IncrementalSort => NodeCategory::Sort,
            Self::Append | Self::MergeAppend | Self::SetOp | Self::RecursiveUnion => {
                NodeCategory::SetOperation
            }
            Self::Gather | Self::GatherMerge => NodeCategory::Parallel,
            Self::ModifyTable | Self::LockRows => NodeCategory::Modify,
            Self::Hash | Self::Materialize | Self::Memoize | Self::Limit | Self::Unique => {
                NodeCategory::Control
            }
            Self::Result | Self::Unknown => NodeCategory::Other,
        }
    }

    /// Short explanation of what the operation does
    pub fn description(&self) -> &'static str {
        match self {
            Self::SeqScan => "Reads every row of the table",
            Self::IndexScan => "Finds rows through an index, then fetches them from the table",
            Self::IndexOnlyScan => "Answers the query from the index without visiting the table",
            Self::BitmapIndexScan => "Marks matching row locations in a bitmap",
            Self::BitmapHeapScan => "Fetches the table pages flagged by a bitmap",
            Self::TidScan => "Fetches rows directly by tuple id",
            Self::SubqueryScan => "Reads the output of a subquery",
            Self::FunctionScan => "Reads rows produced by a function",
            Self::ValuesScan => "Reads a VALUES list",
            Self::CteScan => "Reads the result of a common table expression",
            Self::ForeignScan => "Reads from a foreign or extension-provided source",
            Self::NestedLoop => "Joins by scanning the inner side once per outer row",
            Self::HashJoin => "Joins by probing a hash table built from the inner side",
            Self::MergeJoin => "Joins two inputs sorted on the join key",
            Self::Aggregate => "Computes aggregates, optionally per group",
            Self::WindowAgg => "Evaluates window functions",
            Self::Sort => "Sorts its input",
            Self::IncrementalSort => "Sorts input that is already partially ordered",
            Self::Hash => "Builds a hash table for the parent join",
            Self::Materialize => "Keeps its input in memory for repeated reads",
            Self::Memoize => "Caches inner lookups for repeated keys",
            Self::Limit => "Stops after a number of rows",
            Self::Unique => "Removes adjacent duplicate rows",
            Self::Append => "Concatenates the output of several inputs",
            Self::MergeAppend => "Merges several sorted inputs",
            Self::SetOp => "Computes INTERSECT or EXCEPT",
            Self::RecursiveUnion => "Evaluates a recursive common table expression",
            Self::Gather => "Collects rows from parallel workers",
            Self::GatherMerge => "Collects sorted rows from parallel workers",
            Self::ModifyTable => "Inserts, updates or deletes rows",
            Self::LockRows => "Locks selected rows (FOR UPDATE/SHARE)",
            Self::Result => "Computes rows without reading a table",
            Self::Unknown => "Unrecognised operation",
        }
    }
}

/// Pre-order (depth-first) iterator over plan nodes
pub struct PlanNodeIterator<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> Iterator for PlanNodeIterator<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
