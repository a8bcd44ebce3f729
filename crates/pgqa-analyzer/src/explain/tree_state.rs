//! Expand/collapse state for one displayed plan
//!
//! The state is two independent id sets: which nodes show their children and
//! which nodes show their secondary fields. Traversal lives on
//! [`DisplayNode`]; this type only records choices. A new analysis result
//! starts from `PlanTreeState::default()`.

use std::collections::HashSet;

use crate::explain::display::{DisplayNode, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanTreeState {
    expanded: HashSet<NodeId>,
    details: HashSet<NodeId>,
}

impl PlanTreeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips whether a node's children are shown
    pub fn toggle(&mut self, id: &NodeId) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.clone());
        }
    }

    /// Expands every node of the tree, replacing the previous set
    pub fn expand_all(&mut self, root: &DisplayNode) {
        self.expanded = node_ids(root).into_iter().collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Flips whether a node's secondary fields are shown
    pub fn toggle_details(&mut self, id: &NodeId) {
        if !self.details.remove(id) {
            self.details.insert(id.clone());
        }
    }

    pub fn show_all_details(&mut self, root: &DisplayNode) {
        self.details = node_ids(root).into_iter().collect();
    }

    pub fn hide_all_details(&mut self) {
        self.details.clear();
    }

    pub fn shows_details(&self, id: &NodeId) -> bool {
        self.details.contains(id)
    }

    /// Nodes currently on screen, in pre-order.
    ///
    /// The root is always visible; a node's children are visited only when
    /// the node is expanded.
    pub fn visible_nodes<'a>(&self, root: &'a DisplayNode) -> Vec<&'a DisplayNode> {
        let mut visible = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            visible.push(node);
            if self.is_expanded(&node.node_id) {
                stack.extend(node.children.iter().rev());
            }
        }
        visible
    }
}

/// Pre-order list of every node id in the tree
pub fn node_ids(root: &DisplayNode) -> Vec<NodeId> {
    root.iter().map(|n| n.node_id.clone()).collect()
}
