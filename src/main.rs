use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use univault::cli::{self, Cli};
use univault::config::Config;
use univault::storage::{FileStorage, Storage};
use univault::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    if let Some(api_url) = &cli.api_url {
        config.api.base_url = api_url.clone();
    }
    if let Some(dir) = &cli.storage_dir {
        config.storage.dir = dir.clone();
    }

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting UniVault client v{}", env!("CARGO_PKG_VERSION"));

    let storage: Arc<dyn Storage> = Arc::new(
        FileStorage::new(&config.storage.dir).with_context(|| {
            format!(
                "Failed to open storage directory {}",
                config.storage.dir.display()
            )
        })?,
    );
    let ctx = AppContext::new(config, storage).context("Failed to create API client")?;

    cli::run_command(&cli, &ctx).await
}
