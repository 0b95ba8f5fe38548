//! Ordering recommendation endpoint

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::cache;
use crate::error::{ApiError, ApiResult};
use crate::models::{Adventurousness, Budget, Menu, PreferenceProfile, RecommendationSet, Vibe};
use crate::services::recommender;
use crate::AppState;

const MIN_GROUP_SIZE: i64 = 1;
const MAX_GROUP_SIZE: i64 = 20;

fn default_vibe() -> String {
    "friends".to_string()
}

fn default_group_size() -> i64 {
    2
}

/// POST /menu/recommend request.
///
/// `prefs` arrives as a free-form object: unknown adventurousness/budget
/// values silently default rather than failing validation.
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub run_id: Uuid,
    #[serde(default = "default_vibe")]
    pub vibe: String,
    #[serde(default = "default_group_size")]
    pub group_size: i64,
    #[serde(default)]
    pub prefs: serde_json::Value,
}

fn profile_from_value(prefs: &serde_json::Value) -> PreferenceProfile {
    let dietary = prefs
        .get("dietary")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    let adventurousness = prefs
        .get("adventurousness")
        .and_then(|v| v.as_str())
        .map(Adventurousness::parse_or_default)
        .unwrap_or_default();

    let budget = prefs
        .get("budget")
        .and_then(|v| v.as_str())
        .map(Budget::parse_or_default)
        .unwrap_or_default();

    PreferenceProfile {
        adventurousness,
        budget,
        dietary,
    }
}

/// POST /menu/recommend
///
/// Returns the cached plan when the preference hash matches; otherwise
/// generates, caches, and returns. Generation failure is surfaced
/// synchronously and never cached.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<RecommendRequest>,
) -> ApiResult<Json<RecommendationSet>> {
    let vibe = Vibe::parse(&request.vibe).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "vibe must be one of: {}",
            Vibe::VALID_VALUES.join(", ")
        ))
    })?;

    if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&request.group_size) {
        return Err(ApiError::BadRequest(format!(
            "group_size must be between {} and {}",
            MIN_GROUP_SIZE, MAX_GROUP_SIZE
        )));
    }
    let group_size = request.group_size as u32;

    let prefs = profile_from_value(&request.prefs);
    let run_id = request.run_id;

    let menu: Menu = state
        .cache
        .get_json(&cache::menu_key(run_id))
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Menu not found. Please extract the menu first.".to_string())
        })?;

    let prefs_hash = recommender::preference_hash(run_id, vibe, group_size, &prefs)?;
    let cache_key = cache::recommendations_key(run_id, &prefs_hash);

    tracing::info!(
        run_id = %run_id,
        user = %identity.user_id,
        vibe = vibe.as_str(),
        group_size = group_size,
        "Recommendation requested"
    );

    let result = state
        .cache
        .get_or_compute(&cache_key, || async {
            recommender::generate_recommendations(
                state.model.as_ref(),
                &menu,
                vibe,
                group_size,
                &prefs,
            )
            .await
        })
        .await?;

    Ok(Json(result))
}

/// Build recommendation routes
pub fn recommend_routes() -> Router<AppState> {
    Router::new().route("/menu/recommend", post(recommend))
}
