use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use vidnova_core::types::DbId;

/// One immutable revision of an element. `(element_id, version_number)`
/// is unique; numbers start at 1 and grow without gaps under normal
/// operation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ElementVersion {
    pub id: DbId,
    pub element_id: DbId,
    pub version_number: i32,
    pub parent_version_id: Option<DbId>,
    pub status_id: i16,
    pub source: String,
    pub prompt: Option<String>,
    pub attributes: serde_json::Value,
    pub asset_id: Option<DbId>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateElementVersion {
    pub parent_version_id: Option<DbId>,
    #[serde(default = "default_source")]
    pub source: String,
    pub prompt: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Value,
    pub asset_id: Option<DbId>,
    pub created_by: Option<String>,
}

fn default_source() -> String {
    "generate".to_string()
}

/// Outcome of inserting a version whose input may declare a parent.
#[derive(Debug)]
pub enum VersionInsert {
    Created(ElementVersion),
    /// `parent_version_id` does not reference a version of this element.
    InvalidParent(DbId),
}
