//! Request extractors with review-specific rejections.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use bookreviews_core::ReviewId;

use super::error::ApiError;

/// `{id}` path segment that must parse as a 32-bit integer.
///
/// Anything else is treated as an unmatched route (404), not as a bad
/// request.
#[derive(Debug, Clone, Copy)]
pub struct ReviewIdPath(pub ReviewId);

impl<S> FromRequestParts<S> for ReviewIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::RouteNotFound)?;
        raw.parse().map(Self).map_err(|_| ApiError::RouteNotFound)
    }
}

/// JSON body whose parse failures all report 400 (or 413 for oversized
/// bodies), before any validation runs.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(ApiError::PayloadTooLarge)
            }
            Err(rejection) => Err(ApiError::MalformedBody(rejection.body_text())),
        }
    }
}
