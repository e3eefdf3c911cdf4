use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vidnova_core::types::DbId;

/// A finished media object owned by a user, typically the output of an
/// element version. Like uploads, `gcs_uri` memoizes the provider-side
/// mirror copy.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub user_id: String,
    pub storage_path: String,
    pub gcs_uri: Option<String>,
    pub public_url: Option<String>,
    pub mime_type: String,
    pub size_bytes: Option<i64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAsset {
    pub storage_path: String,
    pub public_url: Option<String>,
    pub mime_type: String,
    pub size_bytes: Option<i64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "image".to_string()
}
