//! Extraction front door and run-status polling
//!
//! POST /menu/extract triggers the pipeline; GET /menu/:run_id is the sole
//! mechanism for observing async progress.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::Identity;
use crate::cache;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{Menu, RunStatus};
use crate::pipeline::extraction;
use crate::AppState;

/// POST /menu/extract request
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub run_id: Uuid,
}

/// POST /menu/extract response
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
}

/// GET /menu/:run_id response
#[derive(Debug, Serialize)]
pub struct RunStatusResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<Menu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /menu/extract
///
/// Front door: validates and either short-circuits with the current status
/// or dispatches the extraction worker and returns PROCESSING immediately.
pub async fn start_extraction(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<ExtractRequest>,
) -> ApiResult<Json<ExtractResponse>> {
    let status = extraction::submit_extraction(&state, request.run_id).await?;

    tracing::info!(
        run_id = %request.run_id,
        user = %identity.user_id,
        status = ?status,
        "Extraction submitted"
    );

    Ok(Json(ExtractResponse {
        run_id: request.run_id,
        status,
    }))
}

/// GET /menu/:run_id
///
/// Polling contract: PENDING and PROCESSING pass through, FAILED carries the
/// recorded error, EXTRACTED attaches the cached menu.
pub async fn get_run_status(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<RunStatusResponse>> {
    let run = db::runs::get_run(&state.db, run_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Run not found: {}", run_id)))?;

    let mut response = RunStatusResponse {
        run_id,
        status: run.status,
        menu: None,
        error: None,
    };

    match run.status {
        RunStatus::Pending | RunStatus::Processing => {}
        RunStatus::Failed => {
            response.error = Some(run.error.unwrap_or_else(|| "Unknown error".to_string()));
        }
        RunStatus::Extracted => {
            let menu: Menu = state
                .cache
                .get_json(&cache::menu_key(run_id))
                .await?
                .ok_or_else(|| ApiError::NotFound("Menu data not found".to_string()))?;
            response.menu = Some(menu);
        }
    }

    Ok(Json(response))
}

/// Build menu routes
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/menu/extract", post(start_extraction))
        .route("/menu/:run_id", get(get_run_status))
}
