//! Durable [`ReviewStore`] backed by an embedded `redb` database file.
//!
//! Layout:
//! - `reviews`: `i32 -> bytes`, one row per review. The value is the
//!   `(title, rating)` pair encoded with `rmp-serde`.
//! - `meta`: `&str -> i32`, holds the next id under [`NEXT_ID_KEY`].
//!
//! `redb` is synchronous, so every call runs on the blocking thread pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bookreviews_core::{BookReview, ReviewId};
use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::store::{MissingReview, ReviewMutation, ReviewStore};

const REVIEWS: TableDefinition<ReviewId, &[u8]> = TableDefinition::new("reviews");
const META: TableDefinition<&str, ReviewId> = TableDefinition::new("meta");
const NEXT_ID_KEY: &str = "next_id";

/// Persisted columns of a review row. The id is the table key.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    title: String,
    rating: i32,
}

impl StoredRow {
    fn into_review(self, id: ReviewId) -> BookReview {
        BookReview {
            id,
            title: self.title,
            rating: self.rating,
        }
    }
}

/// File-backed store.
///
/// [`close`](ReviewStore::close) releases the database handle; calls made
/// afterwards fail. The file itself is closed once blocking calls still in
/// flight drop their handle.
pub struct RedbReviewStore {
    db: RwLock<Option<Arc<Database>>>,
    path: PathBuf,
}

impl RedbReviewStore {
    /// Opens the database at `path`, creating the file if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or is not a valid
    /// `redb` database.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path)
            .with_context(|| format!("failed to open review database {}", path.display()))?;
        Ok(Self {
            db: RwLock::new(Some(Arc::new(db))),
            path,
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = self
            .db
            .read()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("review store {} is closed", self.path.display()))?;
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

fn encode_row(review: &BookReview) -> anyhow::Result<Vec<u8>> {
    let row = StoredRow {
        title: review.title.clone(),
        rating: review.rating,
    };
    Ok(rmp_serde::to_vec(&row)?)
}

fn decode_row(id: ReviewId, bytes: &[u8]) -> anyhow::Result<BookReview> {
    let row: StoredRow =
        rmp_serde::from_slice(bytes).with_context(|| format!("corrupt review row {id}"))?;
    Ok(row.into_review(id))
}

#[async_trait]
impl ReviewStore for RedbReviewStore {
    fn name(&self) -> &'static str {
        "redb"
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        self.blocking(|db| {
            let txn = db.begin_write()?;
            txn.open_table(REVIEWS)?;
            txn.open_table(META)?;
            txn.commit()?;
            Ok(())
        })
        .await?;
        info!("redb review store ready at {}", self.path.display());
        Ok(())
    }

    async fn load_all(&self) -> anyhow::Result<Vec<BookReview>> {
        self.blocking(|db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(REVIEWS)?;
            let mut reviews = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                reviews.push(decode_row(key.value(), value.value())?);
            }
            Ok(reviews)
        })
        .await
    }

    async fn load(&self, id: ReviewId) -> anyhow::Result<Option<BookReview>> {
        self.blocking(move |db| {
            let txn = db.begin_read()?;
            let table = txn.open_table(REVIEWS)?;
            let review = table
                .get(id)?
                .map(|value| decode_row(id, value.value()))
                .transpose()?;
            Ok(review)
        })
        .await
    }

    async fn allocate_id(&self) -> anyhow::Result<ReviewId> {
        self.blocking(|db| {
            let txn = db.begin_write()?;
            let id = {
                let mut meta = txn.open_table(META)?;
                let id = meta.get(NEXT_ID_KEY)?.map_or(1, |guard| guard.value());
                let next = id
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("review id space exhausted"))?;
                meta.insert(NEXT_ID_KEY, next)?;
                id
            };
            txn.commit()?;
            Ok(id)
        })
        .await
    }

    async fn apply(&self, batch: &[ReviewMutation]) -> anyhow::Result<()> {
        let batch = batch.to_vec();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(REVIEWS)?;
                for mutation in &batch {
                    match mutation {
                        ReviewMutation::Upsert(review) => {
                            table.insert(review.id, encode_row(review)?.as_slice())?;
                        }
                        ReviewMutation::Update(review) => {
                            let exists = table.get(review.id)?.is_some();
                            if !exists {
                                // Dropping the uncommitted transaction aborts the batch.
                                return Err(MissingReview { id: review.id }.into());
                            }
                            table.insert(review.id, encode_row(review)?.as_slice())?;
                        }
                        ReviewMutation::Delete(id) => {
                            table.remove(*id)?;
                        }
                    }
                }
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn close(&self) -> anyhow::Result<()> {
        if self.db.write().take().is_some() {
            info!("closed redb review store at {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: ReviewId, title: &str, rating: i32) -> BookReview {
        BookReview {
            id,
            title: title.to_string(),
            rating,
        }
    }

    async fn open_temp() -> (tempfile::TempDir, RedbReviewStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbReviewStore::open(dir.path().join("reviews.redb")).unwrap();
        store.initialize().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn empty_after_initialize() {
        let (_dir, store) = open_temp().await;
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(store.load(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn apply_then_load() {
        let (_dir, store) = open_temp().await;
        store
            .apply(&[
                ReviewMutation::Upsert(review(2, "B", 5)),
                ReviewMutation::Upsert(review(1, "A", 4)),
            ])
            .await
            .unwrap();

        assert_eq!(store.load(1).await.unwrap(), Some(review(1, "A", 4)));
        assert_eq!(
            store.load_all().await.unwrap(),
            vec![review(1, "A", 4), review(2, "B", 5)]
        );

        store.apply(&[ReviewMutation::Delete(1)]).await.unwrap();
        assert_eq!(store.load_all().await.unwrap(), vec![review(2, "B", 5)]);
    }

    #[tokio::test]
    async fn update_of_missing_row_aborts_transaction() {
        let (_dir, store) = open_temp().await;
        store
            .apply(&[ReviewMutation::Upsert(review(1, "A", 4))])
            .await
            .unwrap();

        let err = store
            .apply(&[
                ReviewMutation::Delete(1),
                ReviewMutation::Update(review(1, "A2", 2)),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.downcast_ref::<MissingReview>(), Some(&MissingReview { id: 1 }));
        assert_eq!(store.load(1).await.unwrap(), Some(review(1, "A", 4)));
    }

    #[tokio::test]
    async fn ids_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.redb");

        {
            let store = RedbReviewStore::open(&path).unwrap();
            store.initialize().await.unwrap();
            assert_eq!(store.allocate_id().await.unwrap(), 1);
            assert_eq!(store.allocate_id().await.unwrap(), 2);
            store
                .apply(&[ReviewMutation::Upsert(review(2, "Kept", 3))])
                .await
                .unwrap();
            store.close().await.unwrap();
        }

        let store = RedbReviewStore::open(&path).unwrap();
        store.initialize().await.unwrap();
        assert_eq!(store.allocate_id().await.unwrap(), 3);
        assert_eq!(store.load(2).await.unwrap(), Some(review(2, "Kept", 3)));
    }

    #[tokio::test]
    async fn close_releases_the_file() {
        let (dir, store) = open_temp().await;
        store
            .apply(&[ReviewMutation::Upsert(review(1, "A", 4))])
            .await
            .unwrap();
        store.close().await.unwrap();
        store.close().await.unwrap();

        assert!(store.load_all().await.is_err());

        let reopened = RedbReviewStore::open(dir.path().join("reviews.redb")).unwrap();
        assert_eq!(reopened.load(1).await.unwrap(), Some(review(1, "A", 4)));
    }

    #[test]
    fn reports_path_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.redb");
        let store = RedbReviewStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.name(), "redb");
    }
}
