//! Extraction pipeline operations
//!
//! Two distinct operations, never a flag-branching shared function:
//! [`submit_extraction`] is the fast synchronous front door;
//! [`run_extraction_work`] is invoked only by the dispatcher.

use menulens_common::{Error, Result};
use uuid::Uuid;

use crate::cache;
use crate::db;
use crate::models::RunStatus;
use crate::models::Run;
use crate::pipeline::dispatcher;
use crate::services::completion::ImageAttachment;
use crate::services::menu_extractor;
use crate::AppState;

/// Front door: validate, transition to PROCESSING, dispatch, return.
///
/// Performs only validation-level I/O (existence checks). If the run is
/// already EXTRACTED or PROCESSING the current status is returned without a
/// new dispatch, which makes duplicate calls harmless.
pub async fn submit_extraction(state: &AppState, run_id: Uuid) -> Result<RunStatus> {
    let run = db::runs::get_run(&state.db, run_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Run not found: {}", run_id)))?;

    // Short-circuit: no second dispatch for a run already in flight or done
    if run.status == RunStatus::Extracted {
        return Ok(RunStatus::Extracted);
    }
    if run.status == RunStatus::Processing {
        return Ok(RunStatus::Processing);
    }

    if run.keys.is_empty() {
        return Err(Error::InvalidInput("No images found for this run".to_string()));
    }

    // Verify every referenced upload exists before committing to PROCESSING
    for key in &run.keys {
        if !state.uploads.exists(key).await? {
            return Err(Error::NotFound(format!("Image not found: {}", key)));
        }
    }

    db::runs::update_status(&state.db, run_id, RunStatus::Processing, None).await?;
    dispatcher::dispatch_extraction(state.clone(), run);

    Ok(RunStatus::Processing)
}

/// Worker: download, extract, cache, finish. Invoked only by the dispatcher,
/// which converts any error returned here into a FAILED status update.
pub async fn run_extraction_work(state: &AppState, run: &Run) -> Result<()> {
    let mut images = Vec::with_capacity(run.keys.len());
    for key in &run.keys {
        let object = state
            .uploads
            .get(key)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Image not found: {}", key)))?;
        images.push(ImageAttachment {
            bytes: object.bytes,
            content_type: object.content_type,
        });
    }

    let menu = menu_extractor::extract_menu(state.model.as_ref(), &images).await?;

    state
        .cache
        .put_json(&cache::menu_key(run.run_id), &menu)
        .await?;

    db::runs::update_status(&state.db, run.run_id, RunStatus::Extracted, None).await?;

    Ok(())
}
