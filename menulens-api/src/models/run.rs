//! Run lifecycle state machine
//!
//! A run progresses PENDING → PROCESSING → EXTRACTED | FAILED.
//! EXTRACTED and FAILED are terminal. A request to enter PROCESSING while
//! already PROCESSING is a no-op that reports the current state, which makes
//! the extraction front door safe under duplicate calls.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days before a run record expires and becomes eligible for cleanup.
/// Cached image artifacts outlive this on purpose (they are shared across runs).
pub const RUN_TTL_DAYS: i64 = 7;

/// Run lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    /// Created, uploads may still be in flight
    Pending,
    /// Extraction worker dispatched
    Processing,
    /// Menu artifact written, extraction finished
    Extracted,
    /// Extraction failed with a recorded error
    Failed,
}

impl RunStatus {
    /// Check whether this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Extracted | RunStatus::Failed)
    }

    /// Check whether a transition to `next` is allowed.
    ///
    /// Self-transitions are allowed everywhere so duplicate status writes
    /// stay idempotent.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            RunStatus::Pending => next == RunStatus::Processing,
            RunStatus::Processing => next.is_terminal(),
            RunStatus::Extracted | RunStatus::Failed => false,
        }
    }
}

/// One submitted set of menu photos and its lifecycle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Current lifecycle state
    pub status: RunStatus,

    /// Upload keys referenced by this run, immutable after creation
    pub keys: Vec<String>,

    /// Google Maps URL captured at submission time, if any
    pub maps_url: Option<String>,

    /// Error message, set only when status is FAILED
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Record expiry; derived artifacts have independent lifetimes
    pub expires_at: DateTime<Utc>,
}

impl Run {
    /// Create a new run in PENDING state
    pub fn new(keys: Vec<String>, maps_url: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4(), keys, maps_url)
    }

    /// Create a run with a caller-chosen id. Upload keys embed the run_id,
    /// so the id must exist before the keys do.
    pub fn with_id(run_id: Uuid, keys: Vec<String>, maps_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            status: RunStatus::Pending,
            keys,
            maps_url,
            error: None,
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(RUN_TTL_DAYS),
        }
    }
}
