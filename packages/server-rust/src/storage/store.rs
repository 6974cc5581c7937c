//! Persistence backend trait for reviews.
//!
//! Defines [`ReviewStore`], the durable side of the storage layer. Request
//! handling never talks to a store directly; it goes through a
//! [`ReviewSession`](super::ReviewSession), which stages mutations and hands
//! them to [`ReviewStore::apply`] as one batch on commit.

use async_trait::async_trait;
use bookreviews_core::{BookReview, ReviewId};

/// A single staged change, applied on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewMutation {
    /// Insert the review or overwrite the row with the same id.
    Upsert(BookReview),
    /// Overwrite an existing row. Fails the whole batch with
    /// [`MissingReview`] if the row is gone.
    Update(BookReview),
    /// Delete the row with this id. Deleting a missing row is a no-op.
    Delete(ReviewId),
}

impl ReviewMutation {
    /// Id of the row this mutation touches.
    #[must_use]
    pub fn id(&self) -> ReviewId {
        match self {
            Self::Upsert(review) | Self::Update(review) => review.id,
            Self::Delete(id) => *id,
        }
    }
}

/// An [`ReviewMutation::Update`] targeted a row that no longer exists,
/// typically because another request deleted it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("review {id} no longer exists")]
pub struct MissingReview {
    pub id: ReviewId,
}

/// Pluggable persistence backend for reviews.
/// Implementations: in-memory (tests, ephemeral runs), `redb` (durable file).
///
/// Used as `Arc<dyn ReviewStore>`.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn name(&self) -> &'static str;

    /// One-time initialization (e.g., create tables).
    async fn initialize(&self) -> anyhow::Result<()>;

    /// Load every live review, ordered by ascending id.
    async fn load_all(&self) -> anyhow::Result<Vec<BookReview>>;

    /// Load a single review by id.
    async fn load(&self, id: ReviewId) -> anyhow::Result<Option<BookReview>>;

    /// Reserve the next unused id. Ids are never handed out twice, even if
    /// the review they were reserved for is never committed.
    async fn allocate_id(&self) -> anyhow::Result<ReviewId>;

    /// Apply a batch of mutations atomically, in order. If any mutation
    /// fails, none of the batch is applied.
    async fn apply(&self, batch: &[ReviewMutation]) -> anyhow::Result<()>;

    /// Release resources and close files.
    async fn close(&self) -> anyhow::Result<()>;
}
