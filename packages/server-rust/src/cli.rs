//! Command-line and environment configuration for the server binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::logging::LogFormat;
use crate::network::NetworkConfig;
use crate::storage::{StoreConfig, StoreKind};

/// Book reviews REST API server.
#[derive(Debug, Clone, Parser)]
#[command(name = "bookreviews-server", version, about)]
pub struct ServerArgs {
    /// Address to bind.
    #[arg(long, env = "BOOKREVIEWS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on (0 picks a free port).
    #[arg(long, env = "BOOKREVIEWS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Storage backend.
    #[arg(long, env = "BOOKREVIEWS_STORE", value_enum, default_value_t = StoreKind::Redb)]
    pub store: StoreKind,

    /// Database file for the redb backend.
    #[arg(long, env = "BOOKREVIEWS_DB_PATH", default_value = "Reviews.redb")]
    pub db_path: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long, env = "BOOKREVIEWS_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Allowed CORS origin; repeat for several. `*` allows any.
    #[arg(long = "cors-origin", env = "BOOKREVIEWS_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "BOOKREVIEWS_MAX_BODY_BYTES", default_value_t = 64 * 1024)]
    pub max_body_bytes: usize,

    /// Log output format.
    #[arg(long, env = "BOOKREVIEWS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ServerArgs {
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_body_bytes: self.max_body_bytes,
            ..NetworkConfig::default()
        }
    }

    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            kind: self.store,
            db_path: self.db_path.clone(),
        }
    }
}
