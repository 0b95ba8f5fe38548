//! Pipeline-level tests driving the extraction operations directly

mod helpers;

use std::sync::Arc;
use uuid::Uuid;

use helpers::{sample_menu_json, test_context, MemoryStore, StaticResolver, StaticSearch};
use menulens_api::db;
use menulens_api::models::RunStatus;
use menulens_api::pipeline::extraction;
use menulens_api::services::completion::{CompletionModel, ImageAttachment, TextCompletionRequest};
use menulens_api::storage::ObjectStore;
use menulens_api::AppState;
use menulens_common::Error;

#[tokio::test]
async fn submit_moves_pending_run_to_processing() {
    let ctx = test_context().await;
    let run_id = Uuid::new_v4();
    let key = format!("{}/0.jpg", run_id);
    db::runs::create_run(&ctx.pool, run_id, vec![key.clone()], None)
        .await
        .unwrap();
    ctx.uploads
        .put(&key, b"jpeg".to_vec(), "image/jpeg")
        .await
        .unwrap();
    ctx.model.push_vision(Ok(sample_menu_json()));

    let status = extraction::submit_extraction(&ctx.state, run_id)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Processing);

    let run = helpers::wait_for_terminal(&ctx.pool, run_id).await;
    assert_eq!(run.status, RunStatus::Extracted);
}

#[tokio::test]
async fn submit_rejects_run_with_no_registered_uploads() {
    let ctx = test_context().await;
    let run_id = Uuid::new_v4();
    db::runs::create_run(&ctx.pool, run_id, Vec::new(), None)
        .await
        .unwrap();

    let err = extraction::submit_extraction(&ctx.state, run_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let run = db::runs::get_run(&ctx.pool, run_id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Pending);
}

#[tokio::test]
async fn submit_on_processing_run_is_a_no_op() {
    let ctx = test_context().await;
    let run_id = Uuid::new_v4();
    let key = format!("{}/0.jpg", run_id);
    db::runs::create_run(&ctx.pool, run_id, vec![key], None)
        .await
        .unwrap();
    db::runs::update_status(&ctx.pool, run_id, RunStatus::Processing, None)
        .await
        .unwrap();

    // No upload bytes exist, but the in-flight short circuit comes first
    let status = extraction::submit_extraction(&ctx.state, run_id)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Processing);
    assert_eq!(ctx.model.vision_call_count(), 0);
}

struct PanickingModel;

#[async_trait::async_trait]
impl CompletionModel for PanickingModel {
    async fn complete_text(&self, _request: TextCompletionRequest) -> menulens_common::Result<String> {
        panic!("text completion must not run here");
    }

    async fn complete_vision(
        &self,
        _prompt: &str,
        _images: &[ImageAttachment],
    ) -> menulens_common::Result<String> {
        panic!("simulated worker bug");
    }
}

#[tokio::test]
async fn worker_panic_is_recorded_as_failed() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    db::init_tables(&pool).await.unwrap();

    let uploads = Arc::new(MemoryStore::new());
    let state = AppState::new(
        pool.clone(),
        uploads.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(PanickingModel),
        Arc::new(StaticSearch::new()),
        Arc::new(StaticResolver::new()),
        false,
    );

    let run_id = Uuid::new_v4();
    let key = format!("{}/0.jpg", run_id);
    db::runs::create_run(&pool, run_id, vec![key.clone()], None)
        .await
        .unwrap();
    uploads.put(&key, b"jpeg".to_vec(), "image/jpeg").await.unwrap();

    let status = extraction::submit_extraction(&state, run_id).await.unwrap();
    assert_eq!(status, RunStatus::Processing);

    // The panic must not strand the run in PROCESSING
    let run = helpers::wait_for_terminal(&pool, run_id).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().contains("panicked"));
}

#[tokio::test]
async fn failed_run_stays_failed_on_disallowed_transition() {
    let ctx = test_context().await;
    let run_id = Uuid::new_v4();
    db::runs::create_run(&ctx.pool, run_id, vec!["k".to_string()], None)
        .await
        .unwrap();
    db::runs::update_status(&ctx.pool, run_id, RunStatus::Processing, None)
        .await
        .unwrap();
    db::runs::update_status(&ctx.pool, run_id, RunStatus::Failed, Some("boom".to_string()))
        .await
        .unwrap();

    // Terminal states are sticky
    let run = db::runs::update_status(&ctx.pool, run_id, RunStatus::Processing, None)
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.error.as_deref(), Some("boom"));
}
