use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use vidnova_core::types::DbId;

/// Tracking row for one long-running provider operation. Created
/// `queued` with no operation name; `mark_running` fills the name after
/// the submit call succeeds.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoJob {
    pub id: DbId,
    pub user_id: String,
    pub project_id: DbId,
    pub video_version_id: DbId,
    pub provider: String,
    pub operation_name: Option<String>,
    pub status_id: i16,
    pub request: serde_json::Value,
    pub response: serde_json::Value,
    pub error: Option<String>,
    pub poll_error_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Final result of a provider operation, as observed by either the
/// synchronous poll loop or the sweeper.
#[derive(Debug, Clone)]
pub enum TerminalOutcome {
    Succeeded {
        output_gcs_uris: Vec<String>,
        output_mime_types: Vec<String>,
        response: serde_json::Value,
    },
    Failed {
        error: String,
    },
}

impl TerminalOutcome {
    pub fn status_name(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// What `record_terminal` actually did. Both the poll loop and the
/// sweeper may observe the same completion; the first writer applies it
/// and later writers with the same outcome are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalApply {
    /// This call transitioned the job to its terminal state.
    Applied,
    /// The job was already terminal with the same outcome.
    Noop,
    /// The job was already terminal with a different outcome.
    Conflict,
}
