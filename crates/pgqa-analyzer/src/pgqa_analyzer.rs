//! PGQA Analyzer - EXPLAIN plan trees
//!
//! This crate provides functionality for:
//! - Normalizing PostgreSQL `EXPLAIN (FORMAT JSON)` output into a `PlanNode` tree
//! - Display classification, expand/collapse state and text rendering
//! - Plan summaries used in analysis results and LLM prompts
//!
//! Everything here is synchronous and free of I/O.

pub mod explain;
pub mod summary;

pub use explain::*;
pub use summary::*;
