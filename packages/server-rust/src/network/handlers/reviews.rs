//! Review endpoint handlers.
//!
//! Each handler extracts its inputs, delegates to the [`ReviewService`]
//! held in [`AppState`], and lets [`ApiError`] pick the failure status.
//!
//! [`ReviewService`]: crate::service::ReviewService

use axum::extract::{OriginalUri, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use bookreviews_core::{BookReview, ReviewId, ReviewPayload, ReviewSummary};

use super::error::{ApiError, ErrorBody};
use super::extract::{JsonBody, ReviewIdPath};
use super::AppState;

/// Lists every review.
#[utoipa::path(
    get,
    path = "/reviews",
    tag = "reviews",
    responses(
        (status = 200, description = "All reviews", body = Vec<BookReview>),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookReview>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

/// Fetches a single review.
#[utoipa::path(
    get,
    path = "/reviews/{id}",
    tag = "reviews",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "The review", body = BookReview),
        (status = 404, description = "No review with this id", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn get_review(
    State(state): State<AppState>,
    ReviewIdPath(id): ReviewIdPath,
) -> Result<Json<BookReview>, ApiError> {
    Ok(Json(state.service.get(id).await?))
}

/// Provides a summary of all book reviews.
///
/// Returns one row per distinct title with the mean rating of that title,
/// rounded half-to-even to two decimals.
#[utoipa::path(
    get,
    path = "/reviews/summary",
    tag = "reviews",
    responses(
        (status = 200, description = "Average rating per title", body = Vec<ReviewSummary>),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn review_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewSummary>>, ApiError> {
    Ok(Json(state.service.summary().await?))
}

/// Creates a review and returns its id.
///
/// The `Location` header points at the new review under the same prefix
/// the request used.
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    request_body = ReviewPayload,
    responses(
        (status = 201, description = "Created; body is the new id", body = i32,
            headers(("location" = String, description = "URL of the new review"))),
        (status = 400, description = "Body is not a review", body = ErrorBody),
        (status = 422, description = "Blank title or rating outside 1..=5", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    JsonBody(payload): JsonBody<ReviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ReviewId = state.service.create(payload).await?;
    let location = format!("{}/{id}", uri.path().trim_end_matches('/'));
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(id)))
}

/// Updates a single book review.
///
/// The payload is validated before the id is looked up: an invalid payload
/// for a missing id reports 422.
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    tag = "reviews",
    params(("id" = i32, Path, description = "Review id")),
    request_body = ReviewPayload,
    responses(
        (status = 200, description = "The update was successful"),
        (status = 400, description = "The new review was not in the correct format", body = ErrorBody),
        (status = 404, description = "The review was not found", body = ErrorBody),
        (status = 422, description = "The new title or rating was invalid", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn update_review(
    State(state): State<AppState>,
    ReviewIdPath(id): ReviewIdPath,
    JsonBody(payload): JsonBody<ReviewPayload>,
) -> Result<StatusCode, ApiError> {
    state.service.update(id, payload).await?;
    Ok(StatusCode::OK)
}

/// Deletes a review.
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "reviews",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "No review with this id", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    ReviewIdPath(id): ReviewIdPath,
) -> Result<StatusCode, ApiError> {
    state.service.delete(id).await?;
    Ok(StatusCode::OK)
}

/// Fallback for unmatched paths so 404s carry the usual error body.
pub async fn not_found_handler() -> ApiError {
    ApiError::RouteNotFound
}
