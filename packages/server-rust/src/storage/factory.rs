//! Opens the configured [`ReviewStore`] backend.

use std::sync::Arc;

use tracing::info;

use crate::storage::config::{StoreConfig, StoreKind};
use crate::storage::engines::MemoryReviewStore;
use crate::storage::store::ReviewStore;

/// Creates the backend selected by `config` and runs its initialization.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened or initialized, or if
/// it was requested but not compiled in.
pub async fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn ReviewStore>> {
    let store: Arc<dyn ReviewStore> = match config.kind {
        StoreKind::Memory => Arc::new(MemoryReviewStore::new()),
        #[cfg(feature = "redb")]
        StoreKind::Redb => Arc::new(crate::storage::engines::RedbReviewStore::open(
            &config.db_path,
        )?),
        #[cfg(not(feature = "redb"))]
        StoreKind::Redb => anyhow::bail!("this build does not include the redb store"),
    };

    store.initialize().await?;
    info!("opened {} review store", store.name());
    Ok(store)
}
