//! PGQA Server - HTTP API for the PostgreSQL query analyzer
//!
//! - `AnalysisService` - validates a request, explains the query, asks the LLM
//!   and assembles the `AnalysisResult`
//! - `http` - axum router, shared state and handlers
//! - `example_queries` - example queries served to the dashboard
//! - `logging` - tracing subscriber setup for the binary

pub mod example_queries;
pub mod http;
pub mod logging;
mod service;

pub use example_queries::{ExampleQuery, load_examples};
pub use http::{AppState, PlanTreeResponse, create_router};
pub use service::{
    AnalysisService, DatabaseTestRequest, DatabaseTestResponse, ExplainerFactory,
    PostgresExplainerFactory, ServiceConfig, ServiceError,
};
