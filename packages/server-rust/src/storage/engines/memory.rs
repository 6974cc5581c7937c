//! In-memory [`ReviewStore`] implementation.
//!
//! Rows live in a `BTreeMap` behind a `parking_lot` read-write lock, so
//! listing is naturally ordered by id and a whole batch is applied under a
//! single write lock. Contents are lost when the process exits.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use bookreviews_core::{BookReview, ReviewId};
use parking_lot::RwLock;

use crate::storage::store::{MissingReview, ReviewMutation, ReviewStore};

/// Reference store used by tests and by `--store memory`.
pub struct MemoryReviewStore {
    rows: RwLock<BTreeMap<ReviewId, BookReview>>,
    next_id: AtomicI32,
}

impl MemoryReviewStore {
    /// Creates a new, empty store. The first allocated id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
        }
    }

    /// Number of committed rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl Default for MemoryReviewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn load_all(&self) -> anyhow::Result<Vec<BookReview>> {
        Ok(self.rows.read().values().cloned().collect())
    }

    async fn load(&self, id: ReviewId) -> anyhow::Result<Option<BookReview>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn allocate_id(&self) -> anyhow::Result<ReviewId> {
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map_err(|_| anyhow::anyhow!("review id space exhausted"))
    }

    async fn apply(&self, batch: &[ReviewMutation]) -> anyhow::Result<()> {
        let mut rows = self.rows.write();
        // Prior state of each touched row, replayed in reverse on failure.
        let mut undo: Vec<(ReviewId, Option<BookReview>)> = Vec::with_capacity(batch.len());

        for mutation in batch {
            let previous = match mutation {
                ReviewMutation::Upsert(review) => rows.insert(review.id, review.clone()),
                ReviewMutation::Update(review) => match rows.get_mut(&review.id) {
                    Some(row) => Some(std::mem::replace(row, review.clone())),
                    None => {
                        for (id, prior) in undo.into_iter().rev() {
                            match prior {
                                Some(row) => rows.insert(id, row),
                                None => rows.remove(&id),
                            };
                        }
                        return Err(MissingReview { id: review.id }.into());
                    }
                },
                ReviewMutation::Delete(id) => rows.remove(id),
            };
            undo.push((mutation.id(), previous));
        }
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
