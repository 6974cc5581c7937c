//! Book Reviews Core — review model, payload validation, and the per-title summary.

pub mod summary;
pub mod types;
pub mod validation;

pub use summary::{rounded_mean, summarize};
pub use types::{BookReview, ReviewId, ReviewPayload, ReviewSummary};
pub use validation::{ValidatedReview, ValidationError, MAX_RATING, MIN_RATING};
