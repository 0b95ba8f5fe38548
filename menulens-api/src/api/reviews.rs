//! Review mention endpoint
//!
//! Rejections of unsupported URLs are soft failures: a 200 response with
//! empty mentions and a message, so the client can distinguish "nothing to
//! show" from a malformed request.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::cache;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{Menu, ReviewMentionResult};
use crate::services::reviews::{
    self, UrlPolicy, NOT_MAPS_LINK_MESSAGE, SHARE_GOOGLE_MESSAGE,
};
use crate::AppState;

/// POST /menu/reviews request
#[derive(Debug, Deserialize)]
pub struct ReviewsRequest {
    pub run_id: Uuid,
    /// Overrides the URL stored on the run when present
    #[serde(default)]
    pub maps_url: Option<String>,
}

/// POST /menu/reviews
pub async fn review_mentions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<ReviewsRequest>,
) -> ApiResult<Json<ReviewMentionResult>> {
    let run_id = request.run_id;

    // Fall back to the URL captured at submission time
    let maps_url = match request.maps_url {
        Some(url) => Some(url),
        None => {
            let run = db::runs::get_run(&state.db, run_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Run not found: {}", run_id)))?;
            run.maps_url
        }
    };

    let maps_url = match maps_url {
        Some(url) => url,
        None => {
            return Ok(Json(ReviewMentionResult::empty("No Google Maps URL provided")));
        }
    };

    match reviews::validate_maps_url(&maps_url) {
        UrlPolicy::Supported => {}
        UrlPolicy::UnsupportedShareLink => {
            return Ok(Json(ReviewMentionResult::invalid_url(SHARE_GOOGLE_MESSAGE)));
        }
        UrlPolicy::NotMapsLink => {
            return Ok(Json(ReviewMentionResult::invalid_url(NOT_MAPS_LINK_MESSAGE)));
        }
    }

    // Cache key covers the exact URL string; two URLs for the same place
    // cache separately
    let cache_key = cache::reviews_key(run_id, &maps_url);
    if let Some(cached) = state.cache.get_json::<ReviewMentionResult>(&cache_key).await? {
        return Ok(Json(cached));
    }

    let menu: Menu = state
        .cache
        .get_json(&cache::menu_key(run_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu not found".to_string()))?;
    let dish_names = menu.dish_names();

    tracing::info!(
        run_id = %run_id,
        user = %identity.user_id,
        "Fetching reviews"
    );

    let snippets =
        reviews::fetch_reviews(state.search.as_ref(), state.resolver.as_ref(), &maps_url).await;

    let result = if snippets.is_empty() {
        // Cached too: a place with no reviews stays empty for this URL
        ReviewMentionResult::empty("No reviews found")
    } else {
        let mentions =
            reviews::extract_dish_mentions(state.model.as_ref(), &snippets, &dish_names).await;
        ReviewMentionResult {
            review_count: snippets.len(),
            mentions,
            error: None,
            message: None,
        }
    };

    state.cache.put_json(&cache_key, &result).await?;

    Ok(Json(result))
}

/// Build review mention routes
pub fn reviews_routes() -> Router<AppState> {
    Router::new().route("/menu/reviews", post(review_mentions))
}
