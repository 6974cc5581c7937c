//! Business-rule validation of incoming review payloads.

use crate::types::ReviewPayload;

/// Lowest accepted rating.
pub const MIN_RATING: i32 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i32 = 5;

/// Reasons a well-formed payload is rejected as unprocessable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title must not be blank")]
    BlankTitle,
    #[error("rating {rating} is outside the range 1..=5")]
    RatingOutOfRange { rating: i32 },
}

/// A payload that passed validation.
///
/// Can only be obtained through [`ReviewPayload::validate`], so holding one
/// proves the title is non-blank and the rating is in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReview {
    title: String,
    rating: i32,
}

impl ValidatedReview {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub(crate) fn into_parts(self) -> (String, i32) {
        (self.title, self.rating)
    }
}

impl ReviewPayload {
    /// Checks the title and rating rules.
    ///
    /// The title is checked first, so a payload that breaks both rules
    /// reports [`ValidationError::BlankTitle`]. The title is stored as
    /// given; surrounding whitespace is not trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the title is empty or whitespace-only,
    /// or when the rating is outside `MIN_RATING..=MAX_RATING`.
    pub fn validate(self) -> Result<ValidatedReview, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange {
                rating: self.rating,
            });
        }
        Ok(ValidatedReview {
            title: self.title,
            rating: self.rating,
        })
    }
}
