//! HTTP handler definitions for the review server.
//!
//! Defines `AppState` (the shared state carried through axum extractors)
//! and re-exports the handler functions used to build the router.

pub mod error;
pub mod extract;
pub mod health;
pub mod reviews;

pub use error::{ApiError, ErrorBody};
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use reviews::{
    create_review, delete_review, get_review, list_reviews, not_found_handler, review_summary,
    update_review,
};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;
use crate::service::ReviewService;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Cloning is cheap: every field is a handle.
#[derive(Clone)]
pub struct AppState {
    /// Review operations over the configured store.
    pub service: ReviewService,
    /// Lifecycle state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
