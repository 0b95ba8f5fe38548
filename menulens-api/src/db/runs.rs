//! Run registry persistence
//!
//! Status updates merge fields: only status, updated_at, and (optionally)
//! error are touched; keys and maps_url are immutable after creation.
//! No locking anywhere; concurrent writers race with last-write-wins.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use menulens_common::{Error, Result};

use crate::models::{Run, RunStatus};

/// Create a new run record in PENDING state
pub async fn create_run(
    pool: &SqlitePool,
    run_id: Uuid,
    keys: Vec<String>,
    maps_url: Option<String>,
) -> Result<Run> {
    let run = Run::with_id(run_id, keys, maps_url);

    let keys_json = serde_json::to_string(&run.keys)
        .map_err(|e| Error::Internal(format!("Failed to serialize keys: {}", e)))?;
    let status = serde_json::to_string(&run.status)
        .map_err(|e| Error::Internal(format!("Failed to serialize status: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO runs (run_id, status, keys, maps_url, error, created_at, updated_at, expires_at)
        VALUES (?, ?, ?, ?, NULL, ?, ?, ?)
        "#,
    )
    .bind(run.run_id.to_string())
    .bind(&status)
    .bind(&keys_json)
    .bind(&run.maps_url)
    .bind(run.created_at.to_rfc3339())
    .bind(run.updated_at.to_rfc3339())
    .bind(run.expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    tracing::info!(run_id = %run.run_id, key_count = run.keys.len(), "Run created");

    Ok(run)
}

/// Load a run record; `Ok(None)` when the run_id is unknown
pub async fn get_run(pool: &SqlitePool, run_id: Uuid) -> Result<Option<Run>> {
    let row = sqlx::query(
        r#"
        SELECT run_id, status, keys, maps_url, error, created_at, updated_at, expires_at
        FROM runs
        WHERE run_id = ?
        "#,
    )
    .bind(run_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let status: String = row.get("status");
            let status: RunStatus = serde_json::from_str(&status)
                .map_err(|e| Error::Internal(format!("Failed to deserialize status: {}", e)))?;

            let keys: String = row.get("keys");
            let keys: Vec<String> = serde_json::from_str(&keys)
                .map_err(|e| Error::Internal(format!("Failed to deserialize keys: {}", e)))?;

            Ok(Some(Run {
                run_id,
                status,
                keys,
                maps_url: row.get("maps_url"),
                error: row.get("error"),
                created_at: parse_timestamp(row.get("created_at"), "created_at")?,
                updated_at: parse_timestamp(row.get("updated_at"), "updated_at")?,
                expires_at: parse_timestamp(row.get("expires_at"), "expires_at")?,
            }))
        }
        None => Ok(None),
    }
}

/// Update a run's status, always refreshing updated_at.
///
/// Returns the run as stored after the call. A transition the state machine
/// forbids (including any write to a terminal run other than a repeat of its
/// own state) is a no-op that reports the current state; a repeated
/// PROCESSING request in particular simply reports PROCESSING, which keeps
/// the front door safe under duplicate calls.
pub async fn update_status(
    pool: &SqlitePool,
    run_id: Uuid,
    status: RunStatus,
    error: Option<String>,
) -> Result<Run> {
    let current = get_run(pool, run_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Run not found: {}", run_id)))?;

    if !current.status.can_transition_to(status) {
        tracing::warn!(
            run_id = %run_id,
            current = ?current.status,
            requested = ?status,
            "Ignoring disallowed status transition"
        );
        return Ok(current);
    }

    let status_json = serde_json::to_string(&status)
        .map_err(|e| Error::Internal(format!("Failed to serialize status: {}", e)))?;
    let updated_at = Utc::now();

    // Merge semantics: error is only written when provided
    match &error {
        Some(message) => {
            sqlx::query("UPDATE runs SET status = ?, updated_at = ?, error = ? WHERE run_id = ?")
                .bind(&status_json)
                .bind(updated_at.to_rfc3339())
                .bind(message)
                .bind(run_id.to_string())
                .execute(pool)
                .await?;
        }
        None => {
            sqlx::query("UPDATE runs SET status = ?, updated_at = ? WHERE run_id = ?")
                .bind(&status_json)
                .bind(updated_at.to_rfc3339())
                .bind(run_id.to_string())
                .execute(pool)
                .await?;
        }
    }

    tracing::info!(run_id = %run_id, old = ?current.status, new = ?status, "Run status updated");

    Ok(Run {
        status,
        error: error.or(current.error),
        updated_at,
        ..current
    })
}

/// Delete expired run records on startup.
///
/// Cached image artifacts are untouched: their lifetime is independent of
/// the owning run.
pub async fn cleanup_expired_runs(pool: &SqlitePool) -> Result<usize> {
    let result = sqlx::query("DELETE FROM runs WHERE expires_at < ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() as usize)
}

fn parse_timestamp(raw: String, field: &str) -> Result<chrono::DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| Error::Internal(format!("Failed to parse {}: {}", field, e)))
        .map(|dt| dt.with_timezone(&Utc))
}
