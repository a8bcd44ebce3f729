//! Error types for PGQA

use thiserror::Error;

/// Core error type for PGQA operations
#[derive(Error, Debug)]
pub enum PgqaError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query explanation error: {0}")]
    Explain(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for PGQA operations
pub type Result<T> = std::result::Result<T, PgqaError>;
