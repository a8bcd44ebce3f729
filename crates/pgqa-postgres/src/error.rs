//! Error types for the PostgreSQL explainer

use pgqa_core::PgqaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to connect to PostgreSQL: {0}")]
    Connect(String),

    #[error("Connection attempt timed out after {0} seconds")]
    Timeout(u64),

    #[error("Query explanation error: {0}")]
    Explain(String),

    #[error("Database info error: {0}")]
    Info(String),

    #[error("No execution plan returned")]
    NoPlan,

    #[error("Invalid plan JSON: {0}")]
    InvalidPlan(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PostgresError>;

impl From<PostgresError> for PgqaError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::InvalidUrl(_) => PgqaError::Configuration(err.to_string()),
            PostgresError::Connect(_) | PostgresError::Timeout(_) => {
                PgqaError::Connection(err.to_string())
            }
            PostgresError::Explain(msg) => PgqaError::Explain(msg),
            PostgresError::Info(_) => PgqaError::Other(err.to_string()),
            PostgresError::NoPlan | PostgresError::InvalidPlan(_) => {
                PgqaError::Explain(err.to_string())
            }
        }
    }
}
