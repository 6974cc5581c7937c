//! Review service: validation, queries, and mutations over a review store.
//!
//! The service is transport-agnostic. It reports business outcomes as
//! [`ReviewError`] variants; the HTTP layer maps them to status codes.

pub mod error;
pub mod reviews;

pub use error::ReviewError;
pub use reviews::ReviewService;
