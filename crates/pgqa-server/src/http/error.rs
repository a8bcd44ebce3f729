use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::service::ServiceError;

#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidRequest(msg) => HttpError::BadRequest(msg),
            err @ (ServiceError::Failed(_) | ServiceError::DatabaseInfo(_)) => {
                HttpError::Internal(err.to_string())
            }
        }
    }
}
