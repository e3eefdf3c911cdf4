use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vidnova_core::types::DbId;

/// One generation attempt for a video. Carries the full request the
/// provider was (or will be) asked for, plus the outputs once the
/// attempt finishes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoVersion {
    pub id: DbId,
    pub user_id: String,
    pub project_id: DbId,
    pub video_id: DbId,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub mode: String,
    pub aspect_ratio: String,
    pub duration_seconds: i32,
    pub resolution: String,
    pub generate_audio: bool,
    pub sample_count: i32,
    pub reference_asset_ids: serde_json::Value,
    pub reference_upload_ids: serde_json::Value,
    pub request: serde_json::Value,
    pub output_gcs_uris: serde_json::Value,
    pub output_mime_types: serde_json::Value,
    pub status_id: i16,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideoVersion {
    pub user_id: String,
    pub project_id: DbId,
    pub video_id: DbId,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub mode: String,
    pub aspect_ratio: String,
    pub duration_seconds: i32,
    pub resolution: String,
    pub generate_audio: bool,
    pub sample_count: i32,
}
