//! EXPLAIN plan tree
//!
//! - `plan` - the `PlanNode` model
//! - `postgres` - normalizer for `EXPLAIN (FORMAT JSON)` documents
//! - `display` - primary/secondary field split, labels and node ids
//! - `tree_state` - expand/collapse and details state
//! - `render` - plain-text tree output
//!
//! # Example
//!
//! ```
//! use pgqa_analyzer::explain::{DisplayNode, PlanTreeState, parse_json_explain, render_tree};
//!
//! let root = parse_json_explain(r#"[{"Plan": {"Node Type": "Seq Scan", "Total Cost": 10.0}}]"#).unwrap();
//! let display = DisplayNode::from_plan(&root);
//! let mut state = PlanTreeState::new();
//! state.expand_all(&display);
//! assert_eq!(render_tree(&display, &state), "-> Seq Scan  (cost=10.00)\n");
//! ```

pub mod display;
pub mod labels;
pub mod plan;
pub mod postgres;
pub mod render;
pub mod tree_state;

pub use display::{DisplayField, DisplayNode, DisplayValue, NodeId, PRIMARY_KEYS};
pub use labels::{FieldLabel, label_for};
pub use plan::{AttributeValue, NodeCategory, NodeKind, PlanNode, PlanNodeIterator};
pub use postgres::{PlanParseError, normalize_plan, parse_json_explain, plan_tree};
pub use render::render_tree;
pub use tree_state::{PlanTreeState, node_ids};
