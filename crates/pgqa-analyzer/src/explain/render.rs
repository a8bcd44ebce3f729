//! Plain-text rendering of a display tree
//!
//! ```text
//! -> Hash Join  (cost=10.50..120.75 rows=500)  [+7 more]
//!     -> Seq Scan on orders  (cost=0.00..35.50 rows=2550)  [+2 more]
//! ```

use crate::explain::display::{DisplayNode, DisplayValue};
use crate::explain::postgres::{PLAN_ROWS, STARTUP_COST, TOTAL_COST};
use crate::explain::tree_state::PlanTreeState;

const INDENT: &str = "    ";

/// Renders the nodes visible under `state`, one line per node.
pub fn render_tree(root: &DisplayNode, state: &PlanTreeState) -> String {
    let mut out = String::new();
    render_node(&mut out, root, state);
    out
}

fn render_node(out: &mut String, node: &DisplayNode, state: &PlanTreeState) {
    let indent = INDENT.repeat(node.depth);
    let expanded = state.is_expanded(&node.node_id);
    let details = state.shows_details(&node.node_id);

    out.push_str(&indent);
    out.push_str("-> ");
    out.push_str(&headline(node));

    if !details && node.secondary_count() > 0 {
        out.push_str(&format!("  [+{} more]", node.secondary_count()));
    }
    if !expanded && node.has_children() {
        let n = node.children.len();
        let noun = if n == 1 { "child" } else { "children" };
        out.push_str(&format!("  ({} {} hidden)", n, noun));
    }
    out.push('\n');

    if details {
        for field in &node.secondary_fields {
            out.push_str(&format!(
                "{}       {}: {}\n",
                indent,
                field.label,
                format_value(&field.key, &field.value)
            ));
        }
    }

    if expanded {
        for child in &node.children {
            render_node(out, child, state);
        }
    }
}

/// `Node Type [on relation]  (cost=startup..total rows=n)`
fn headline(node: &DisplayNode) -> String {
    let mut line = node.node_type.clone();
    if let Some(DisplayValue::Text(relation)) = node.field("Relation Name").map(|f| &f.value) {
        line.push_str(" on ");
        line.push_str(relation);
    }

    let number = |key: &str| node.field(key).and_then(|f| f.value.as_f64());
    let mut figures = Vec::new();
    match (number(STARTUP_COST), number(TOTAL_COST)) {
        (Some(startup), Some(total)) => figures.push(format!("cost={:.2}..{:.2}", startup, total)),
        (None, Some(total)) => figures.push(format!("cost={:.2}", total)),
        (Some(startup), None) => figures.push(format!("startup={:.2}", startup)),
        (None, None) => {}
    }
    if let Some(rows) = number(PLAN_ROWS) {
        figures.push(format!("rows={}", rows));
    }

    if !figures.is_empty() {
        line.push_str(&format!("  ({})", figures.join(" ")));
    }
    line
}

fn format_value(key: &str, value: &DisplayValue) -> String {
    match value {
        DisplayValue::Number(n) if key.ends_with("Cost") => format!("{:.2}", n),
        other => other.to_string(),
    }
}
