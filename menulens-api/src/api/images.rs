//! Per-dish image lookup endpoint

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::cache;
use crate::error::{ApiError, ApiResult};
use crate::models::Menu;
use crate::services::image_search::{self, DishImageSet};
use crate::AppState;

/// POST /menu/images request
#[derive(Debug, Deserialize)]
pub struct ImagesRequest {
    pub run_id: Uuid,
}

/// POST /menu/images
///
/// Fans out per-dish image lookups and caches the aggregate once per run,
/// so repeat calls are a single cache read. Entry order in the aggregate
/// reflects completion order, not menu order.
pub async fn dish_images(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<ImagesRequest>,
) -> ApiResult<Json<DishImageSet>> {
    let run_id = request.run_id;

    let menu: Menu = state
        .cache
        .get_json(&cache::menu_key(run_id))
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Menu not found. Please extract the menu first.".to_string())
        })?;

    let result = state
        .cache
        .get_or_compute(&cache::images_key(run_id), || async {
            let dish_names = menu.dish_names();
            tracing::info!(
                run_id = %run_id,
                user = %identity.user_id,
                dishes = dish_names.len(),
                "Fanning out image lookups"
            );
            Ok(image_search::fetch_dish_image_set(
                Arc::clone(&state.search),
                state.db.clone(),
                dish_names,
            )
            .await)
        })
        .await?;

    Ok(Json(result))
}

/// Build image lookup routes
pub fn images_routes() -> Router<AppState> {
    Router::new().route("/menu/images", post(dish_images))
}
