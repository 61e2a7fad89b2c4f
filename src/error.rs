use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::schedule::ValidationError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Booking {id} is {status} and cannot be cancelled")]
    NotConfirmed { id: String, status: &'static str },
}

impl ServiceError {
    pub(crate) fn class_not_found(id: &str) -> Self {
        ServiceError::NotFound {
            entity: "Class",
            id: id.to_string(),
        }
    }

    pub(crate) fn booking_not_found(id: &str) -> Self {
        ServiceError::NotFound {
            entity: "Booking",
            id: id.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

/// Malformed or mistyped request bodies are reported like any other invalid
/// input.
impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::BadRequest(value.body_text())
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(_) => ApiError::BadRequest(value.to_string()),
            ServiceError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            ServiceError::NotConfirmed { .. } => ApiError::Conflict(value.to_string()),
            ServiceError::Persistence(StoreError::NotFound { .. }) => {
                ApiError::NotFound("Record not found".into())
            }
            ServiceError::Persistence(err) => {
                error!("Store error: {err}");
                ApiError::Internal("Failed to save changes".into())
            }
        }
    }
}
