//! Async dispatcher
//!
//! Hands extraction work to a background tokio task and returns immediately.
//! The task body is isolated: an error or panic in the worker is converted
//! into a FAILED status update on the run, so the caller never observes the
//! worker's outcome through the dispatch itself. Completion is visible only
//! by polling the run registry.
//!
//! Known limitation: if the process dies before the failure handler runs,
//! the run stays PROCESSING indefinitely. There is no lease or heartbeat;
//! polling clients must treat a long-lived PROCESSING as possibly stuck.

use menulens_common::Error;

use crate::db;
use crate::models::{Run, RunStatus};
use crate::pipeline::extraction;
use crate::AppState;

/// Spawn the extraction worker for a run. Returns before any work executes.
pub fn dispatch_extraction(state: AppState, run: Run) {
    tokio::spawn(async move {
        let run_id = run.run_id;
        tracing::info!(run_id = %run_id, "Extraction worker started");

        // The work runs on its own task so a panic surfaces here as a
        // JoinError instead of killing the failure handler with it.
        let worker_state = state.clone();
        let worker_run = run.clone();
        let handle = tokio::spawn(async move {
            extraction::run_extraction_work(&worker_state, &worker_run).await
        });

        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => Err(Error::Internal(
                "Extraction worker panicked".to_string(),
            )),
            Err(join_err) => Err(Error::Internal(format!(
                "Extraction worker aborted: {}",
                join_err
            ))),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(run_id = %run_id, "Extraction complete");
            }
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "Extraction failed");

                if let Err(update_err) = db::runs::update_status(
                    &state.db,
                    run_id,
                    RunStatus::Failed,
                    Some(e.to_string()),
                )
                .await
                {
                    // The run may now be stuck in PROCESSING; nothing more
                    // we can do from inside the worker.
                    tracing::error!(
                        run_id = %run_id,
                        error = %update_err,
                        "Failed to record extraction failure"
                    );
                }
            }
        }
    });
}
