//! Repository for the `user_uploads` table.

use sqlx::PgPool;
use vidnova_core::types::DbId;

use crate::models::upload::{CreateUserUpload, UserUpload};

const COLUMNS: &str =
    "id, user_id, storage_path, gcs_uri, original_name, mime_type, created_at";

pub struct UploadRepo;

impl UploadRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        input: &CreateUserUpload,
    ) -> Result<UserUpload, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_uploads (user_id, storage_path, original_name, mime_type) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserUpload>(&query)
            .bind(user_id)
            .bind(&input.storage_path)
            .bind(&input.original_name)
            .bind(&input.mime_type)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UserUpload>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_uploads WHERE id = $1");
        sqlx::query_as::<_, UserUpload>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Vec<UserUpload>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_uploads WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, UserUpload>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Memoize the provider-side mirror location for an upload.
    pub async fn set_gcs_uri(
        pool: &PgPool,
        id: DbId,
        gcs_uri: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE user_uploads SET gcs_uri = $2 WHERE id = $1")
            .bind(id)
            .bind(gcs_uri)
            .execute(pool)
            .await?;
        Ok(())
    }
}
