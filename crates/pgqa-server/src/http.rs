//! HTTP API
//!
//! JSON in and out. Errors are `{"detail": "..."}` with 400 for rejected
//! requests and 500 for failed analyses.

mod error;
mod handlers;
mod router;
mod state;

pub use error::HttpError;
pub use handlers::PlanTreeResponse;
pub use router::create_router;
pub use state::AppState;
