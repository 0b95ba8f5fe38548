//! menulens-api - Menu Intelligence Service
//!
//! Turns photographed restaurant menus into structured data and derived
//! artifacts (per-dish images, ordering recommendations, review mentions)
//! behind a polling HTTP API.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use menulens_api::config::Config;
use menulens_api::services::reviews::HttpUrlResolver;
use menulens_api::services::{OpenAiClient, SerpApiClient};
use menulens_api::storage::FsObjectStore;
use menulens_api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting menulens-api");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let data_dir_arg = std::env::args().nth(1);
    let config = Config::load(data_dir_arg.as_deref())?;
    menulens_common::config::ensure_data_dir(&config.data_dir)?;
    info!("Data directory: {}", config.data_dir.display());

    let db_pool = menulens_api::db::init_database_pool(&config.database_path()).await?;
    info!("Database connection established");

    let removed = menulens_api::db::runs::cleanup_expired_runs(&db_pool).await?;
    if removed > 0 {
        info!(removed, "Expired runs removed");
    }

    // Collaborator clients: constructed once, injected everywhere
    let uploads = Arc::new(FsObjectStore::new(config.uploads_root()));
    let cache_store = Arc::new(FsObjectStore::new(config.cache_root()));
    let model = Arc::new(OpenAiClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
    )?);
    let search = Arc::new(SerpApiClient::new(
        config.serpapi_base_url.clone(),
        config.serpapi_key.clone(),
    )?);
    let resolver = Arc::new(HttpUrlResolver::new()?);

    if !config.auth_enabled {
        tracing::warn!("API authentication disabled");
    }

    let state = AppState::new(
        db_pool,
        uploads,
        cache_store,
        model,
        search,
        resolver,
        config.auth_enabled,
    );

    let app = menulens_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
