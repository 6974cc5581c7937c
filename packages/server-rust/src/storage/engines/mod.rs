//! [`ReviewStore`](super::ReviewStore) implementations.
//!
//! [`MemoryReviewStore`] is always available; [`RedbReviewStore`] is built
//! with the default `redb` feature.

mod memory;
#[cfg(feature = "redb")]
mod redb_store;

pub use memory::MemoryReviewStore;
#[cfg(feature = "redb")]
pub use redb_store::RedbReviewStore;
