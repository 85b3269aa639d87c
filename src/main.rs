//! Safar API Server
//!
//! Run with: cargo run --bin safar
//!
//! # Configuration
//!
//! Read from `$SAFAR_CONFIG` when set, otherwise from the default search
//! path (`~/.config/safar/config.toml`, `/etc/safar/config.toml`,
//! `./config.toml`). `SAFAR_*` environment variables override file values;
//! `RUST_LOG` overrides the configured log level.

use safar::analytics::Dataset;
use safar::api::{serve, AppState};
use safar::config::Config;
use safar::logging;
use safar::store::{DataStore, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::var_os("SAFAR_CONFIG") {
        Some(path) => Config::load_with_env(&PathBuf::from(path))?,
        None => Config::load_default(),
    };

    logging::init(&config.logging)?;

    tracing::info!("Starting Safar API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.storage.data_dir);

    // Initialize the data store
    let store = Arc::new(DataStore::open(StoreConfig {
        data_dir: Some(PathBuf::from(&config.storage.data_dir)),
        channel_capacity: config.storage.channel_capacity,
    })?);

    store.seed_topics(&config.feed.topics)?;

    let stats = store.stats()?;
    tracing::info!("Store stats: {}", stats);

    // Load the deals dataset
    let dataset = Dataset::load_or_sample(
        config.dataset.deals_path.as_deref(),
        config.dataset.sharks_path.as_deref(),
    )?;
    tracing::info!(
        deals = dataset.deals().len(),
        sharks = dataset.sharks().len(),
        seasons = ?dataset.seasons(),
        "Dataset loaded"
    );

    if config.auth.users.is_empty() {
        tracing::warn!(
            "No users configured under [[auth.users]], login-only routes will reject every request"
        );
    }

    // Background chat retention
    let sweep = store.start_retention_sweep(
        config.chat.retention_days,
        Duration::from_secs(config.chat.retention_sweep_secs),
    );

    let state = AppState::from_config(Arc::clone(&store), Arc::new(dataset), &config);

    // Run server
    serve(state, &config.api).await?;

    if let Some(handle) = sweep {
        handle.abort();
    }
    tracing::info!("Safar API server stopped");

    Ok(())
}
