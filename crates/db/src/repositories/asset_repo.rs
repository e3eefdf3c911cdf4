//! Repository for the `assets` table.

use sqlx::PgPool;
use vidnova_core::types::DbId;

use crate::models::asset::{Asset, CreateAsset};

const COLUMNS: &str = "\
    id, user_id, storage_path, gcs_uri, public_url, mime_type, \
    size_bytes, width, height, kind, created_at";

pub struct AssetRepo;

impl AssetRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        input: &CreateAsset,
    ) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets \
                 (user_id, storage_path, public_url, mime_type, size_bytes, width, height, kind) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(user_id)
            .bind(&input.storage_path)
            .bind(&input.public_url)
            .bind(&input.mime_type)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.kind)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Memoize the provider-side mirror location for an asset.
    pub async fn set_gcs_uri(
        pool: &PgPool,
        id: DbId,
        gcs_uri: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE assets SET gcs_uri = $2 WHERE id = $1")
            .bind(id)
            .bind(gcs_uri)
            .execute(pool)
            .await?;
        Ok(())
    }
}
