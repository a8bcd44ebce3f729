//! Error types for LLM analysis

use pgqa_core::PgqaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<LlmError> for PgqaError {
    fn from(err: LlmError) -> Self {
        PgqaError::Llm(err.to_string())
    }
}
