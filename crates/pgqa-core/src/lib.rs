//! PGQA Core - Shared types and seams for the query analyzer
//!
//! This crate provides the types every other PGQA crate agrees on:
//!
//! - `AnalysisResult` - The aggregate returned to the dashboard for one query
//! - `PlanExplainer` - Trait for anything that can produce an EXPLAIN plan
//! - `PgqaError` - Common error type
//! - Connection-URL and query safety checks used before touching a database

mod analysis;
mod error;
mod explainer;
pub mod security;

pub use analysis::*;
pub use error::*;
pub use explainer::*;
pub use security::{DatabaseUrlPolicy, is_safe_query, sanitize_db_url_for_logging};
