//! Review storage for the server.
//!
//! Two layers:
//!
//! - [`ReviewStore`]: the persistence backend, shared as `Arc<dyn ReviewStore>`
//! - [`ReviewSession`]: a per-request unit of work that stages mutations and
//!   commits them to the store as one batch
//!
//! [`open_store`] builds the backend named by a [`StoreConfig`].

pub mod config;
pub mod engines;
pub mod factory;
pub mod session;
pub mod store;

pub use config::{StoreConfig, StoreKind};
pub use factory::open_store;
pub use session::ReviewSession;
pub use store::{MissingReview, ReviewMutation, ReviewStore};
