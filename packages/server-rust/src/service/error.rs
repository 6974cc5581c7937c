use bookreviews_core::{ReviewId, ValidationError};

/// Outcome of a review operation that did not succeed.
///
/// Business failures (`Invalid`, `NotFound`) are distinct from
/// infrastructure failures (`Storage`), which are never retried here.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("invalid review: {0}")]
    Invalid(#[from] ValidationError),
    #[error("review {id} not found")]
    NotFound { id: ReviewId },
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ReviewError {
    /// Short label recorded on the operation span.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid",
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "storage_error",
        }
    }
}
