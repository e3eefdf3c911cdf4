use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vidnova_core::types::DbId;

/// A user-uploaded file living in primary storage. `gcs_uri` is the
/// mirror cache: `None` until the object has been copied to provider
/// storage, after which all requests reuse the mirrored copy.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserUpload {
    pub id: DbId,
    pub user_id: String,
    pub storage_path: String,
    pub gcs_uri: Option<String>,
    pub original_name: Option<String>,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserUpload {
    pub storage_path: String,
    pub original_name: Option<String>,
    pub mime_type: String,
}
