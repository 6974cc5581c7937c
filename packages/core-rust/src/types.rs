use serde::{Deserialize, Serialize};

use crate::validation::ValidatedReview;

/// Store-assigned identifier of a review.
pub type ReviewId = i32;

/// A single rated evaluation of a book.
///
/// Only the store constructs new instances (it owns id assignment), so a
/// `BookReview` obtained from a store always satisfies the title and rating
/// invariants checked by [`ReviewPayload::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookReview {
    /// Unique, immutable identifier.
    pub id: ReviewId,
    /// Title of the reviewed book. Never blank.
    pub title: String,
    /// Rating in the closed range `1..=5`.
    pub rating: i32,
}

impl BookReview {
    /// Builds a review from a validated draft and a freshly allocated id.
    #[must_use]
    pub fn from_validated(id: ReviewId, review: ValidatedReview) -> Self {
        let (title, rating) = review.into_parts();
        Self { id, title, rating }
    }

    /// Replaces title and rating in place. The id is left untouched.
    pub fn replace(&mut self, review: ValidatedReview) {
        let (title, rating) = review.into_parts();
        self.title = title;
        self.rating = rating;
    }
}

/// Request body accepted by create and update.
///
/// Unknown fields (including `id`) are ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewPayload {
    /// Title of the reviewed book.
    pub title: String,
    /// Rating between 1 and 5 inclusive.
    pub rating: i32,
}

impl ReviewPayload {
    #[must_use]
    pub fn new(title: impl Into<String>, rating: i32) -> Self {
        Self {
            title: title.into(),
            rating,
        }
    }
}

/// Synthetic per-title aggregate produced by the summary query.
///
/// Not a stored entity, so it has no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewSummary {
    /// Title shared by every review in the group.
    pub title: String,
    /// Mean rating of the group, rounded half-to-even to 2 decimals.
    pub rating: f64,
}
