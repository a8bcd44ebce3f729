//! UI-facing view of a plan tree
//!
//! A [`DisplayNode`] splits a node's fields into the four that are always
//! shown (`Node Type`, `Total Cost`, `Plan Rows`, `Startup Cost`) and the
//! rest, each carrying a label and description. Values are converted to
//! display form here but numbers are not formatted; that is left to the
//! renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::explain::labels::label_for;
use crate::explain::plan::{AttributeValue, PlanNode};
use crate::explain::postgres::{NODE_TYPE, PLAN_ROWS, PLAN_WIDTH, STARTUP_COST, TOTAL_COST};

/// Keys that are always shown, in display order
pub const PRIMARY_KEYS: [&str; 4] = [NODE_TYPE, TOTAL_COST, PLAN_ROWS, STARTUP_COST];

/// Expand/collapse key of a node: `"{depth}-{sibling_index}-{node_type}"`.
///
/// Derived from the node's position, so it is stable across re-renders of
/// the same plan. It is not unique when two parents at the same depth have
/// a child of the same type at the same index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(depth: usize, sibling_index: usize, node_type: &str) -> Self {
        Self(format!("{}-{}-{}", depth, sibling_index, node_type))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Display form of a field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl DisplayValue {
    fn from_attribute(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Number(n) => match n.as_f64() {
                Some(f) => Self::Number(f),
                None => Self::Text(n.to_string()),
            },
            other => Self::Text(attribute_text(other)),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Text form of an attribute: lists comma-joined, flags as Yes/No
fn attribute_text(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Flag(true) => "Yes".to_string(),
        AttributeValue::Flag(false) => "No".to_string(),
        AttributeValue::Number(n) => n.to_string(),
        AttributeValue::Text(s) => s.clone(),
        AttributeValue::List(items) => items
            .iter()
            .map(attribute_text)
            .collect::<Vec<_>>()
            .join(", "),
        AttributeValue::Json(serde_json::Value::Null) => String::new(),
        AttributeValue::Json(other) => other.to_string(),
    }
}

/// A labelled field ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayField {
    pub key: String,
    pub label: String,
    pub description: String,
    pub value: DisplayValue,
}

impl DisplayField {
    fn new(key: &str, value: DisplayValue) -> Self {
        let (label, description) = label_for(key);
        Self {
            key: key.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            value,
        }
    }
}

/// A plan node prepared for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayNode {
    pub node_id: NodeId,
    pub node_type: String,
    pub depth: usize,
    pub sibling_index: usize,
    pub primary_fields: Vec<DisplayField>,
    pub secondary_fields: Vec<DisplayField>,
    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    /// Builds the display tree for a plan root (depth 0, index 0)
    pub fn from_plan(root: &PlanNode) -> Self {
        Self::build(root, 0, 0)
    }

    fn build(node: &PlanNode, depth: usize, sibling_index: usize) -> Self {
        let mut primary_fields = vec![DisplayField::new(
            NODE_TYPE,
            DisplayValue::Text(node.node_type.clone()),
        )];
        let primary_numbers = [
            (TOTAL_COST, node.total_cost),
            (PLAN_ROWS, node.estimated_rows.map(|r| r as f64)),
            (STARTUP_COST, node.startup_cost),
        ];
        primary_fields.extend(
            primary_numbers
                .into_iter()
                .filter_map(|(key, value)| Some(DisplayField::new(key, DisplayValue::Number(value?)))),
        );

        let mut secondary_fields = Vec::with_capacity(node.attributes.len() + 1);
        if let Some(width) = node.row_width_bytes {
            secondary_fields.push(DisplayField::new(PLAN_WIDTH, DisplayValue::Number(width as f64)));
        }
        secondary_fields.extend(
            node.attributes
                .iter()
                .map(|(key, value)| DisplayField::new(key, DisplayValue::from_attribute(value))),
        );

        let children = node
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| Self::build(child, depth + 1, index))
            .collect();

        Self {
            node_id: NodeId::new(depth, sibling_index, &node.node_type),
            node_type: node.node_type.clone(),
            depth,
            sibling_index,
            primary_fields,
            secondary_fields,
            children,
        }
    }

    /// Number of fields behind the "show more" affordance
    pub fn secondary_count(&self) -> usize {
        self.secondary_fields.len()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Finds a field by key in either group
    pub fn field(&self, key: &str) -> Option<&DisplayField> {
        self.primary_fields
            .iter()
            .chain(&self.secondary_fields)
            .find(|f| f.key == key)
    }

    /// Pre-order iterator over this subtree
    pub fn iter(&self) -> impl Iterator<Item = &DisplayNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}
