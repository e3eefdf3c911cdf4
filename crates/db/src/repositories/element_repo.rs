//! Repository for the `elements` table.

use sqlx::PgPool;
use vidnova_core::types::DbId;

use crate::models::element::{CreateElement, Element, LatestElementAsset, UpdateElement};
use crate::models::status::ElementStatus;

const COLUMNS: &str = "\
    id, user_id, kind, name, summary, status_id, latest_version_id, \
    thumbnail_url, tags, created_at, updated_at";

pub struct ElementRepo;

impl ElementRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        input: &CreateElement,
    ) -> Result<Element, sqlx::Error> {
        let query = format!(
            "INSERT INTO elements (user_id, kind, name, summary, status_id, tags) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Element>(&query)
            .bind(user_id)
            .bind(&input.kind)
            .bind(&input.name)
            .bind(&input.summary)
            .bind(ElementStatus::Draft.id())
            .bind(&input.tags)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Element>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM elements WHERE id = $1");
        sqlx::query_as::<_, Element>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an element only if it belongs to the given user.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        user_id: &str,
    ) -> Result<Option<Element>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM elements WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Element>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Vec<Element>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM elements WHERE user_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Element>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateElement,
    ) -> Result<Option<Element>, sqlx::Error> {
        let query = format!(
            "UPDATE elements \
             SET name = COALESCE($2, name), \
                 summary = COALESCE($3, summary), \
                 status_id = COALESCE($4, status_id), \
                 thumbnail_url = COALESCE($5, thumbnail_url), \
                 tags = COALESCE($6, tags), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Element>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.summary)
            .bind(input.status_id)
            .bind(&input.thumbnail_url)
            .bind(&input.tags)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM elements WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Resolve an element to the asset behind its latest version, for
    /// pinned `asset:<id>` tokens and tagged mentions.
    pub async fn find_latest_asset_by_id(
        pool: &PgPool,
        element_id: DbId,
    ) -> Result<Option<LatestElementAsset>, sqlx::Error> {
        sqlx::query_as::<_, LatestElementAsset>(
            "SELECT e.id AS element_id, e.name AS element_name, \
                    a.id AS asset_id, a.storage_path, a.gcs_uri, a.mime_type, \
                    a.user_id AS asset_user_id \
             FROM elements e \
             JOIN element_versions ev ON ev.id = e.latest_version_id \
             JOIN assets a ON a.id = ev.asset_id \
             WHERE e.id = $1",
        )
        .bind(element_id)
        .fetch_optional(pool)
        .await
    }
}
