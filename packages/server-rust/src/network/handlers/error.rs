//! Mapping of review outcomes onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookreviews_core::ValidationError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::ReviewError;

/// JSON body returned with every error status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
    /// HTTP status code, repeated for clients that only see the body.
    pub status: u16,
}

/// Error returned by review HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The body could not be parsed into the expected shape.
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("request body too large")]
    PayloadTooLarge,
    /// No route matches, including ids that are not 32-bit integers.
    #[error("resource not found")]
    RouteNotFound,
    #[error(transparent)]
    Review(#[from] ReviewError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Review(ReviewError::Invalid(err))
    }
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RouteNotFound | Self::Review(ReviewError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            Self::Review(ReviewError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Review(ReviewError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Storage details are logged by the service, never sent to clients.
        let error = match &self {
            Self::Review(ReviewError::Storage(_)) => "internal server error".to_string(),
            other => other.to_string(),
        };
        let body = ErrorBody {
            error,
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
