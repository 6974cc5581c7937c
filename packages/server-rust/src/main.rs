use bookreviews_server::cli::ServerArgs;
use bookreviews_server::logging::init_tracing;
use bookreviews_server::network::{os_shutdown_signal, NetworkModule};
use bookreviews_server::{open_store, ReviewService};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_format, "info,tower_http=debug")?;

    let store = open_store(&args.store_config()).await?;
    let service = ReviewService::new(store.clone());

    let mut network = NetworkModule::new(args.network_config(), service);
    let port = network.start().await?;
    info!(port, store = store.name(), "book reviews server starting");

    let result = network.serve(os_shutdown_signal()).await;

    if let Err(err) = store.close().await {
        error!("failed to close review store: {err:#}");
    }
    result
}
