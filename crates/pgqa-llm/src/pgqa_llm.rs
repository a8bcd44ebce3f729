//! PGQA LLM - Query analysis through a chat-completion model
//!
//! This crate provides:
//! - `LlmProvider` - trait for chat-completion backends (OpenAI-compatible, no-op)
//! - Prompt construction from a query and its EXPLAIN plan
//! - Parsing of the model's JSON answer into an `LlmAssessment`
//! - `LlmAnalyzer` - ties the above together behind a bounded result cache

mod analyzer;
mod cache;
mod error;
pub mod prompt;
mod provider;
pub mod response;

pub use analyzer::LlmAnalyzer;
pub use cache::{AnalysisCache, CacheStats, cache_key};
pub use error::{LlmError, Result};
pub use provider::{
    ChatMessage, ChatRequest, LlmProvider, NoOpProvider, OpenAiProvider, ProviderConfig,
    ProviderMetadata,
};
pub use response::parse_assessment;
