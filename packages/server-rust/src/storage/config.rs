//! Storage backend selection.

use std::path::PathBuf;

/// Which [`ReviewStore`](super::ReviewStore) backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    /// Volatile in-process store.
    Memory,
    /// Embedded `redb` database file.
    Redb,
}

/// Storage configuration for the server.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend to open at startup.
    pub kind: StoreKind,
    /// Database file used by file-backed stores.
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Redb,
            db_path: PathBuf::from("Reviews.redb"),
        }
    }
}
