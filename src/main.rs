//! Censys Summarizer - HTTP Server Entry Point
//!
//! Loads the host dataset once, then serves the agent API.

use std::sync::Arc;

use censys_summarizer::{api, config::Config, dataset::Dataset};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up HF_API_KEY and friends from a local .env, if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "censys_summarizer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={} max_iterations={}",
        config.default_model, config.max_iterations
    );
    if config.api_key.is_none() {
        tracing::warn!("HF_API_KEY is not set; model calls will fail");
    }

    // The dataset is required; without it no request can be served.
    let dataset = Arc::new(Dataset::load(&config.dataset_path)?);

    info!("Starting server on {}:{}", config.host, config.port);

    api::serve(config, dataset).await?;

    Ok(())
}
