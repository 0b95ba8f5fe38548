//! Upload registration: creates the run and mints its upload keys
//!
//! Presigned-URL cryptography belongs to the storage layer in front of this
//! service; the response carries the storage keys clients upload to.

use axum::{
    extract::State,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MAX_UPLOADS: usize = 10;

/// POST /uploads/presign request
#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    pub content_types: Vec<String>,
    #[serde(default)]
    pub maps_url: Option<String>,
}

/// POST /uploads/presign response
#[derive(Debug, Serialize)]
pub struct PresignResponse {
    pub run_id: Uuid,
    pub keys: Vec<String>,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// POST /uploads/presign
///
/// Validates the requested upload set and creates the run in PENDING state.
pub async fn presign_uploads(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<PresignRequest>,
) -> ApiResult<Json<PresignResponse>> {
    if request.content_types.is_empty() || request.content_types.len() > MAX_UPLOADS {
        return Err(ApiError::BadRequest(format!(
            "content_types must contain between 1 and {} entries",
            MAX_UPLOADS
        )));
    }

    let run_id = Uuid::new_v4();
    let mut keys = Vec::with_capacity(request.content_types.len());
    for (index, content_type) in request.content_types.iter().enumerate() {
        let ext = extension_for(content_type).ok_or_else(|| {
            ApiError::BadRequest(format!("Unsupported content type: {}", content_type))
        })?;
        keys.push(format!("{}/{}.{}", run_id, index, ext));
    }

    let run = db::runs::create_run(&state.db, run_id, keys, request.maps_url).await?;

    tracing::info!(
        run_id = %run.run_id,
        user = %identity.user_id,
        uploads = run.keys.len(),
        "Upload set registered"
    );

    Ok(Json(PresignResponse {
        run_id: run.run_id,
        keys: run.keys,
    }))
}

/// Build upload registration routes
pub fn presign_routes() -> Router<AppState> {
    Router::new().route("/uploads/presign", post(presign_uploads))
}
