use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vidnova_core::types::DbId;

/// A named creative entity (character, object) that accumulates
/// versions. `latest_version_id` tracks the newest version row and is
/// kept in step with version inserts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Element {
    pub id: DbId,
    pub user_id: String,
    pub kind: String,
    pub name: String,
    pub summary: Option<String>,
    pub status_id: i16,
    pub latest_version_id: Option<DbId>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateElement {
    pub kind: String,
    pub name: String,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateElement {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub status_id: Option<i16>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Join row pairing an element with the asset behind its latest version.
/// Used when resolving `@mention` and pinned references to provider media.
#[derive(Debug, Clone, FromRow)]
pub struct LatestElementAsset {
    pub element_id: DbId,
    pub element_name: String,
    pub asset_id: DbId,
    pub storage_path: String,
    pub gcs_uri: Option<String>,
    pub mime_type: String,
    pub asset_user_id: String,
}
