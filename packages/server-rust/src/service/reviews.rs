//! Review operations: list, get, summary, create, update, delete.
//!
//! Each call opens its own [`ReviewSession`], so the service keeps no state
//! between requests. Every operation runs inside a `review_op` span that
//! records its outcome and duration.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use bookreviews_core::{summarize, BookReview, ReviewId, ReviewPayload, ReviewSummary};
use tracing::{info_span, Instrument};

use super::error::ReviewError;
use crate::storage::{MissingReview, ReviewSession, ReviewStore};

/// Validates input and executes review operations against a store.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
}

impl ReviewService {
    #[must_use]
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Name of the backing store.
    #[must_use]
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    fn session(&self) -> ReviewSession {
        ReviewSession::new(Arc::clone(&self.store))
    }

    /// All live reviews, ordered by id.
    ///
    /// # Errors
    ///
    /// [`ReviewError::Storage`] if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<BookReview>, ReviewError> {
        traced("list", async {
            let reviews = self.session().list().await?;
            Ok::<_, ReviewError>(reviews)
        })
        .await
    }

    /// A single review by id.
    ///
    /// # Errors
    ///
    /// [`ReviewError::NotFound`] if no live review has `id`.
    pub async fn get(&self, id: ReviewId) -> Result<BookReview, ReviewError> {
        traced("get", async {
            self.session()
                .get(id)
                .await?
                .ok_or(ReviewError::NotFound { id })
        })
        .await
    }

    /// Mean rating per distinct title, ordered by title.
    ///
    /// # Errors
    ///
    /// [`ReviewError::Storage`] if the store cannot be read.
    pub async fn summary(&self) -> Result<Vec<ReviewSummary>, ReviewError> {
        traced("summary", async {
            let reviews = self.session().list().await?;
            Ok::<_, ReviewError>(summarize(&reviews))
        })
        .await
    }

    /// Validates and stores a new review, returning its assigned id.
    ///
    /// # Errors
    ///
    /// [`ReviewError::Invalid`] if the payload breaks a validation rule;
    /// nothing is stored in that case.
    pub async fn create(&self, payload: ReviewPayload) -> Result<ReviewId, ReviewError> {
        traced("create", async {
            let review = payload.validate()?;
            let mut session = self.session();
            let created = session.create(review).await?;
            session.commit().await?;
            Ok::<_, ReviewError>(created.id)
        })
        .await
    }

    /// Replaces the title and rating of an existing review.
    ///
    /// The payload is validated before the id is looked up, so an invalid
    /// payload for a missing id reports [`ReviewError::Invalid`].
    ///
    /// # Errors
    ///
    /// [`ReviewError::Invalid`] for a bad payload, then
    /// [`ReviewError::NotFound`] if no live review has `id`, including when
    /// the review is deleted between lookup and commit.
    pub async fn update(&self, id: ReviewId, payload: ReviewPayload) -> Result<(), ReviewError> {
        traced("update", async {
            let replacement = payload.validate()?;
            let mut session = self.session();
            let mut review = session
                .get(id)
                .await?
                .ok_or(ReviewError::NotFound { id })?;
            review.replace(replacement);
            session.update(review);
            session
                .commit()
                .await
                .map_err(|err| match err.downcast::<MissingReview>() {
                    Ok(missing) => ReviewError::NotFound { id: missing.id },
                    Err(err) => ReviewError::Storage(err),
                })?;
            Ok::<_, ReviewError>(())
        })
        .await
    }

    /// Deletes a review.
    ///
    /// # Errors
    ///
    /// [`ReviewError::NotFound`] if no live review has `id`.
    pub async fn delete(&self, id: ReviewId) -> Result<(), ReviewError> {
        traced("delete", async {
            let mut session = self.session();
            let review = session
                .get(id)
                .await?
                .ok_or(ReviewError::NotFound { id })?;
            session.remove(&review);
            session.commit().await?;
            Ok::<_, ReviewError>(())
        })
        .await
    }
}

/// Runs `fut` inside a `review_op` span and records outcome and duration.
async fn traced<T, F>(op: &'static str, fut: F) -> Result<T, ReviewError>
where
    F: Future<Output = Result<T, ReviewError>>,
{
    let span = info_span!(
        "review_op",
        op = op,
        duration_ms = tracing::field::Empty,
        outcome = tracing::field::Empty,
    );

    async move {
        let start = Instant::now();
        let result = fut.await;

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(err) => err.outcome(),
        };
        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::Span::current().record("outcome", outcome);

        if let Err(ReviewError::Storage(err)) = &result {
            tracing::error!(op, error = %err, "review operation failed");
        } else {
            tracing::debug!(op, duration_ms, outcome, "review operation complete");
        }

        result
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bookreviews_core::ValidationError;

    use super::*;
    use crate::storage::engines::MemoryReviewStore;
    use crate::storage::ReviewMutation;

    fn service() -> (Arc<MemoryReviewStore>, ReviewService) {
        let store = Arc::new(MemoryReviewStore::new());
        let service = ReviewService::new(Arc::clone(&store) as Arc<dyn ReviewStore>);
        (store, service)
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let (_, service) = service();
        let id = service
            .create(ReviewPayload::new("Dune", 5))
            .await
            .unwrap();

        let review = service.get(id).await.unwrap();
        assert_eq!(review.id, id);
        assert_eq!(review.title, "Dune");
        assert_eq!(review.rating, 5);
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload_without_storing() {
        let (store, service) = service();
        for payload in [
            ReviewPayload::new("Dune", 0),
            ReviewPayload::new("Dune", 6),
            ReviewPayload::new("Dune", -1),
            ReviewPayload::new("   ", 3),
        ] {
            let err = service.create(payload).await.unwrap_err();
            assert!(matches!(err, ReviewError::Invalid(_)));
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn get_update_delete_missing_id_report_not_found() {
        let (_, service) = service();
        assert!(matches!(
            service.get(999_999).await,
            Err(ReviewError::NotFound { id: 999_999 })
        ));
        assert!(matches!(
            service.update(999_999, ReviewPayload::new("Dune", 3)).await,
            Err(ReviewError::NotFound { id: 999_999 })
        ));
        assert!(matches!(
            service.delete(999_999).await,
            Err(ReviewError::NotFound { id: 999_999 })
        ));
    }

    #[tokio::test]
    async fn update_validates_before_lookup() {
        let (_, service) = service();
        let err = service
            .update(999_999, ReviewPayload::new("Dune", 9))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Invalid(ValidationError::RatingOutOfRange { rating: 9 })
        ));
    }

    #[tokio::test]
    async fn update_replaces_fields_and_keeps_id() {
        let (_, service) = service();
        let id = service.create(ReviewPayload::new("Emma", 2)).await.unwrap();

        service
            .update(id, ReviewPayload::new("Persuasion", 4))
            .await
            .unwrap();

        let review = service.get(id).await.unwrap();
        assert_eq!(review.id, id);
        assert_eq!(review.title, "Persuasion");
        assert_eq!(review.rating, 4);
    }

    #[tokio::test]
    async fn invalid_update_leaves_row_unchanged() {
        let (_, service) = service();
        let id = service.create(ReviewPayload::new("Emma", 2)).await.unwrap();

        assert!(service.update(id, ReviewPayload::new("", 4)).await.is_err());

        let review = service.get(id).await.unwrap();
        assert_eq!(review.title, "Emma");
        assert_eq!(review.rating, 2);
    }

    #[tokio::test]
    async fn delete_then_get_reports_not_found() {
        let (_, service) = service();
        let id = service.create(ReviewPayload::new("Emma", 2)).await.unwrap();

        service.delete(id).await.unwrap();

        assert!(matches!(
            service.get(id).await,
            Err(ReviewError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_tracks_creates_minus_deletes() {
        let (_, service) = service();
        let mut ids = Vec::new();
        for rating in 1..=5 {
            ids.push(service.create(ReviewPayload::new("Book", rating)).await.unwrap());
        }
        service.delete(ids[1]).await.unwrap();
        service.delete(ids[3]).await.unwrap();

        let listed: Vec<_> = service.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![ids[0], ids[2], ids[4]]);
    }

    #[tokio::test]
    async fn summary_averages_per_title() {
        let (_, service) = service();
        for (title, rating) in [("B", 5), ("A", 2), ("C", 1), ("A", 4), ("C", 2), ("C", 2)] {
            service.create(ReviewPayload::new(title, rating)).await.unwrap();
        }

        let summary = service.summary().await.unwrap();
        let rows: Vec<_> = summary.iter().map(|s| (s.title.as_str(), s.rating)).collect();
        assert_eq!(rows, vec![("A", 3.0), ("B", 5.0), ("C", 1.67)]);
    }

    /// Store whose reads succeed but whose writes always fail.
    struct ReadOnlyStore;

    #[async_trait]
    impl ReviewStore for ReadOnlyStore {
        fn name(&self) -> &'static str {
            "read-only"
        }
        async fn initialize(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn load_all(&self) -> anyhow::Result<Vec<BookReview>> {
            Ok(Vec::new())
        }
        async fn load(&self, _id: ReviewId) -> anyhow::Result<Option<BookReview>> {
            Ok(None)
        }
        async fn allocate_id(&self) -> anyhow::Result<ReviewId> {
            Ok(1)
        }
        async fn apply(&self, _batch: &[ReviewMutation]) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
        async fn close(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Store that still serves a row its backing table no longer holds, as
    /// when a delete commits between an update's lookup and its commit.
    struct StaleReadStore {
        inner: MemoryReviewStore,
    }

    #[async_trait]
    impl ReviewStore for StaleReadStore {
        fn name(&self) -> &'static str {
            "stale-read"
        }
        async fn initialize(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn load_all(&self) -> anyhow::Result<Vec<BookReview>> {
            self.inner.load_all().await
        }
        async fn load(&self, id: ReviewId) -> anyhow::Result<Option<BookReview>> {
            Ok(Some(BookReview {
                id,
                title: "Dune".to_string(),
                rating: 5,
            }))
        }
        async fn allocate_id(&self) -> anyhow::Result<ReviewId> {
            self.inner.allocate_id().await
        }
        async fn apply(&self, batch: &[ReviewMutation]) -> anyhow::Result<()> {
            self.inner.apply(batch).await
        }
        async fn close(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn update_racing_delete_reports_not_found() {
        let store = Arc::new(StaleReadStore {
            inner: MemoryReviewStore::new(),
        });
        let service = ReviewService::new(Arc::clone(&store) as Arc<dyn ReviewStore>);

        let err = service
            .update(4, ReviewPayload::new("Dune", 1))
            .await
            .unwrap_err();

        assert!(matches!(err, ReviewError::NotFound { id: 4 }));
        assert!(store.inner.is_empty());
    }

    #[tokio::test]
    async fn commit_failure_surfaces_as_storage_error() {
        let service = ReviewService::new(Arc::new(ReadOnlyStore));
        let err = service
            .create(ReviewPayload::new("Dune", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Storage(_)));
        assert_eq!(err.outcome(), "storage_error");
    }
}
