//! Per-request unit of work over a [`ReviewStore`].

use std::collections::BTreeMap;
use std::sync::Arc;

use bookreviews_core::{BookReview, ReviewId, ValidatedReview};

use super::store::{ReviewMutation, ReviewStore};

/// Stages review mutations until [`commit`](ReviewSession::commit).
///
/// Reads see the committed store state with this session's own staged
/// changes laid over it. Nothing staged is visible to other sessions until
/// commit, and dropping a session discards whatever it staged.
pub struct ReviewSession {
    store: Arc<dyn ReviewStore>,
    // Keyed by id: the last staged mutation for a row wins.
    staged: BTreeMap<ReviewId, ReviewMutation>,
}

impl ReviewSession {
    #[must_use]
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
        }
    }

    /// All live reviews, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns the store's error if loading fails.
    pub async fn list(&self) -> anyhow::Result<Vec<BookReview>> {
        let loaded = self.store.load_all().await?;
        if self.staged.is_empty() {
            return Ok(loaded);
        }

        let mut rows: BTreeMap<ReviewId, BookReview> =
            loaded.into_iter().map(|review| (review.id, review)).collect();
        for mutation in self.staged.values() {
            match mutation {
                ReviewMutation::Upsert(review) | ReviewMutation::Update(review) => {
                    rows.insert(review.id, review.clone());
                }
                ReviewMutation::Delete(id) => {
                    rows.remove(id);
                }
            }
        }
        Ok(rows.into_values().collect())
    }

    /// Looks up a single review.
    ///
    /// # Errors
    ///
    /// Returns the store's error if loading fails.
    pub async fn get(&self, id: ReviewId) -> anyhow::Result<Option<BookReview>> {
        match self.staged.get(&id) {
            Some(ReviewMutation::Upsert(review) | ReviewMutation::Update(review)) => {
                Ok(Some(review.clone()))
            }
            Some(ReviewMutation::Delete(_)) => Ok(None),
            None => self.store.load(id).await,
        }
    }

    /// Assigns an id to `review` and stages its insertion.
    ///
    /// # Errors
    ///
    /// Returns the store's error if no id could be allocated.
    pub async fn create(&mut self, review: ValidatedReview) -> anyhow::Result<BookReview> {
        let id = self.store.allocate_id().await?;
        let review = BookReview::from_validated(id, review);
        self.staged.insert(id, ReviewMutation::Upsert(review.clone()));
        Ok(review)
    }

    /// Stages the new state of an existing review.
    ///
    /// A review created in this session stays an insert. Otherwise the row
    /// must still exist when the session commits: an update never brings
    /// back a row that another session deleted.
    pub fn update(&mut self, review: BookReview) {
        let mutation = match self.staged.get(&review.id) {
            Some(ReviewMutation::Upsert(_)) => ReviewMutation::Upsert(review),
            _ => ReviewMutation::Update(review),
        };
        self.staged.insert(mutation.id(), mutation);
    }

    /// Stages the removal of `review`.
    pub fn remove(&mut self, review: &BookReview) {
        self.staged.insert(review.id, ReviewMutation::Delete(review.id));
    }

    /// Number of staged, uncommitted mutations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.staged.len()
    }

    /// Applies all staged mutations as one batch.
    ///
    /// Returns the number of mutations applied. The staged set is cleared
    /// whether or not the store accepts the batch.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the batch could not be applied; in that
    /// case none of it is visible.
    pub async fn commit(&mut self) -> anyhow::Result<usize> {
        let batch: Vec<ReviewMutation> =
            std::mem::take(&mut self.staged).into_values().collect();
        if batch.is_empty() {
            return Ok(0);
        }
        self.store.apply(&batch).await?;
        Ok(batch.len())
    }
}

#[cfg(test)]
mod tests {
    use bookreviews_core::ReviewPayload;

    use super::*;
    use crate::storage::engines::MemoryReviewStore;
    use crate::storage::MissingReview;

    fn draft(title: &str, rating: i32) -> ValidatedReview {
        ReviewPayload::new(title, rating).validate().unwrap()
    }

    fn store() -> Arc<dyn ReviewStore> {
        Arc::new(MemoryReviewStore::new())
    }

    #[tokio::test]
    async fn staged_create_visible_only_to_own_session() {
        let store = store();
        let mut writer = ReviewSession::new(Arc::clone(&store));
        let reader = ReviewSession::new(Arc::clone(&store));

        let created = writer.create(draft("Dune", 5)).await.unwrap();

        assert_eq!(writer.get(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(writer.list().await.unwrap().len(), 1);
        assert!(reader.get(created.id).await.unwrap().is_none());
        assert!(reader.list().await.unwrap().is_empty());

        assert_eq!(writer.commit().await.unwrap(), 1);
        assert_eq!(reader.get(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn dropped_session_discards_changes() {
        let store = store();
        {
            let mut session = ReviewSession::new(Arc::clone(&store));
            session.create(draft("Dune", 5)).await.unwrap();
        }
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_hides_row_before_commit() {
        let store = store();
        let mut setup = ReviewSession::new(Arc::clone(&store));
        let review = setup.create(draft("Emma", 3)).await.unwrap();
        setup.commit().await.unwrap();

        let mut session = ReviewSession::new(Arc::clone(&store));
        session.remove(&review);
        assert!(session.get(review.id).await.unwrap().is_none());
        assert!(session.list().await.unwrap().is_empty());
        assert!(store.load(review.id).await.unwrap().is_some());

        session.commit().await.unwrap();
        assert!(store.load(review.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overlays_committed_row() {
        let store = store();
        let mut session = ReviewSession::new(Arc::clone(&store));
        let mut review = session.create(draft("Emma", 3)).await.unwrap();
        session.commit().await.unwrap();

        review.replace(draft("Persuasion", 4));
        session.update(review.clone());
        assert_eq!(session.pending_count(), 1);
        assert_eq!(session.list().await.unwrap(), vec![review.clone()]);

        session.commit().await.unwrap();
        assert_eq!(session.pending_count(), 0);
        assert_eq!(store.load(review.id).await.unwrap(), Some(review));
    }

    #[tokio::test]
    async fn update_of_row_created_in_same_session_stays_insert() {
        let store = store();
        let mut session = ReviewSession::new(Arc::clone(&store));
        let mut review = session.create(draft("Emma", 3)).await.unwrap();
        review.replace(draft("Emma", 5));
        session.update(review.clone());

        assert_eq!(session.commit().await.unwrap(), 1);
        assert_eq!(store.load(review.id).await.unwrap(), Some(review));
    }

    #[tokio::test]
    async fn update_does_not_revive_row_deleted_by_other_session() {
        let store = store();
        let mut setup = ReviewSession::new(Arc::clone(&store));
        let review = setup.create(draft("Dune", 5)).await.unwrap();
        setup.commit().await.unwrap();

        let mut updater = ReviewSession::new(Arc::clone(&store));
        let mut stale = updater.get(review.id).await.unwrap().unwrap();

        let mut deleter = ReviewSession::new(Arc::clone(&store));
        deleter.remove(&review);
        deleter.commit().await.unwrap();

        stale.replace(draft("Dune", 1));
        updater.update(stale);
        let err = updater.commit().await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<MissingReview>(),
            Some(&MissingReview { id: review.id })
        );
        assert!(store.load(review.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_without_changes_is_noop() {
        let mut session = ReviewSession::new(store());
        assert_eq!(session.commit().await.unwrap(), 0);
    }
}
