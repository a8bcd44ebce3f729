//! Human-readable labels for EXPLAIN fields
//!
//! Unknown keys are not an error: they are shown under their raw name with
//! an empty description.

/// Label and description for one EXPLAIN key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLabel {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

const fn entry(key: &'static str, label: &'static str, description: &'static str) -> FieldLabel {
    FieldLabel {
        key,
        label,
        description,
    }
}

static FIELD_LABELS: &[FieldLabel] = &[
    entry("Node Type", "Operation", "Plan operation performed by this node"),
    entry("Total Cost", "Total Cost", "Estimated cost to return all rows, in planner cost units"),
    entry("Plan Rows", "Estimated Rows", "Number of rows the planner expects this node to emit"),
    entry("Startup Cost", "Startup Cost", "Estimated cost before the first row can be returned"),
    entry("Plan Width", "Row Width", "Estimated average row size in bytes"),
    entry("Relation Name", "Table", "Table read by this node"),
    entry("Schema", "Schema", "Schema of the table"),
    entry("Alias", "Alias", "Name the table is referred to by in the query"),
    entry("Index Name", "Index", "Index used by this node"),
    entry("Index Cond", "Index Condition", "Condition used to search the index"),
    entry("Recheck Cond", "Recheck Condition", "Condition re-checked on fetched heap rows"),
    entry("Filter", "Filter", "Condition applied to rows after they are read"),
    entry("Join Type", "Join Type", "Kind of join (Inner, Left, Semi, ...)"),
    entry("Join Filter", "Join Filter", "Condition applied to joined row pairs"),
    entry("Hash Cond", "Hash Condition", "Join keys compared through the hash table"),
    entry("Merge Cond", "Merge Condition", "Join keys compared between the sorted inputs"),
    entry("Inner Unique", "Inner Unique", "At most one inner row can match each outer row"),
    entry("Parent Relationship", "Relationship", "Role of this node within its parent"),
    entry("Parallel Aware", "Parallel Aware", "Node is written to run inside parallel workers"),
    entry("Async Capable", "Async Capable", "Node can run asynchronously"),
    entry("Scan Direction", "Scan Direction", "Direction an index is walked in"),
    entry("Sort Key", "Sort Key", "Expressions the input is ordered by"),
    entry("Presorted Key", "Presorted Key", "Leading sort keys the input already satisfies"),
    entry("Group Key", "Group Key", "Expressions rows are grouped by"),
    entry("Strategy", "Strategy", "Aggregation strategy (Plain, Sorted, Hashed, Mixed)"),
    entry("Partial Mode", "Partial Mode", "Whether the aggregate is split across workers"),
    entry("Workers Planned", "Workers Planned", "Parallel workers the planner asked for"),
    entry("Single Copy", "Single Copy", "Child plan is run by a single process"),
    entry("Subplan Name", "Subplan", "Name of the subquery this node evaluates"),
    entry("CTE Name", "CTE", "Common table expression read by this node"),
    entry("Function Name", "Function", "Function whose output is scanned"),
    entry("Operation", "Operation", "Row modification performed (Insert, Update, Delete)"),
    entry("Output", "Output", "Columns emitted by this node"),
    entry("Actual Startup Time", "Actual Startup Time", "Measured time to the first row, in ms"),
    entry("Actual Total Time", "Actual Total Time", "Measured time to return all rows, in ms"),
    entry("Actual Rows", "Actual Rows", "Rows actually returned per loop"),
    entry("Actual Loops", "Loops", "Number of times this node was executed"),
    entry("Rows Removed by Filter", "Rows Removed by Filter", "Rows discarded by the filter"),
    entry("Query Type", "Query Type", "Kind of statement that was analyzed"),
    entry("Original Query Type", "Original Query Type", "Statement kind before it was rewritten"),
    entry("Converted From", "Converted From", "Statement that was rewritten for EXPLAIN"),
    entry("Converted Query", "Converted Query", "SELECT used to approximate the statement"),
    entry("Description", "Description", "Summary of a statement without a real plan"),
    entry("Note", "Note", "Additional information about this plan"),
];

/// Looks up the label entry for a key
pub fn lookup(key: &str) -> Option<&'static FieldLabel> {
    FIELD_LABELS.iter().find(|l| l.key == key)
}

/// Returns `(label, description)`, falling back to the raw key and no description
pub fn label_for(key: &str) -> (&str, &'static str) {
    match lookup(key) {
        Some(entry) => (entry.label, entry.description),
        None => (key, ""),
    }
}
