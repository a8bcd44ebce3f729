//! PGQA PostgreSQL - EXPLAIN plans from a live database
//!
//! `PostgresExplainer` implements [`pgqa_core::PlanExplainer`] on top of
//! tokio-postgres. Statements are never executed: SELECTs are explained as
//! they are, INSERT/UPDATE/DELETE are rewritten to an equivalent SELECT and
//! anything else gets a placeholder plan.

mod connection;
mod error;
mod explainer;
pub mod rewrite;

pub use connection::format_postgres_error;
pub use error::{PostgresError, Result};
pub use explainer::PostgresExplainer;
pub use rewrite::{QueryKind, dml_to_select};
