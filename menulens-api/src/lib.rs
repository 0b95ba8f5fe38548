//! menulens-api library interface
//!
//! Turns photographed restaurant menus into structured data and derived
//! artifacts: menu structure, per-dish images, ordering recommendations,
//! and review mentions. A fast synchronous front door validates requests
//! and hands heavy work to background tasks; progress is observable only
//! by polling the run registry.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::cache::ContentCache;
use crate::services::completion::CompletionModel;
use crate::services::reviews::UrlResolver;
use crate::services::search::SearchProvider;
use crate::storage::ObjectStore;

/// Application state shared across handlers.
///
/// The collaborator clients are constructed once at startup and injected
/// here; no module-level singletons anywhere.
#[derive(Clone)]
pub struct AppState {
    /// Run registry and dish image cache
    pub db: SqlitePool,
    /// Raw upload storage
    pub uploads: Arc<dyn ObjectStore>,
    /// Derived-artifact cache
    pub cache: ContentCache,
    /// Completion model (vision + text)
    pub model: Arc<dyn CompletionModel>,
    /// Search provider (images, places, reviews)
    pub search: Arc<dyn SearchProvider>,
    /// Redirect-following resolver for short Maps links
    pub resolver: Arc<dyn UrlResolver>,
    /// Bearer-token checking toggle
    pub auth_enabled: bool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: SqlitePool,
        uploads: Arc<dyn ObjectStore>,
        cache_store: Arc<dyn ObjectStore>,
        model: Arc<dyn CompletionModel>,
        search: Arc<dyn SearchProvider>,
        resolver: Arc<dyn UrlResolver>,
        auth_enabled: bool,
    ) -> Self {
        Self {
            db,
            uploads,
            cache: ContentCache::new(cache_store),
            model,
            search,
            resolver,
            auth_enabled,
            startup_time: Utc::now(),
        }
    }
}

/// Build the application router with the auth interceptor applied
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::presign_routes())
        .merge(api::menu_routes())
        .merge(api::images_routes())
        .merge(api::recommend_routes())
        .merge(api::reviews_routes())
        .merge(api::health_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_auth,
        ))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
