//! Repository for the `element_versions` table.
//!
//! Version numbers are allocated optimistically: read MAX + 1 inside a
//! transaction, insert, and let the unique constraint on
//! `(element_id, version_number)` catch concurrent writers. On a
//! constraint hit the whole transaction is retried with a fresh number,
//! so allocated numbers are dense and never reused.

use sqlx::PgPool;
use vidnova_core::types::DbId;

use crate::models::element_version::{CreateElementVersion, ElementVersion, VersionInsert};

const COLUMNS: &str = "\
    id, element_id, version_number, parent_version_id, status_id, source, \
    prompt, attributes, asset_id, created_by, created_at";

const VERSION_CONSTRAINT: &str = "uq_element_versions_element_version";

/// Upper bound on allocation retries before giving up and surfacing the
/// conflict to the caller.
const MAX_ALLOCATION_ATTEMPTS: u32 = 8;

pub struct ElementVersionRepo;

impl ElementVersionRepo {
    /// Create the next version of an element and advance the element's
    /// `latest_version_id` pointer in the same transaction. A declared
    /// parent must already be a version of the same element.
    pub async fn create(
        pool: &PgPool,
        element_id: DbId,
        input: &CreateElementVersion,
    ) -> Result<VersionInsert, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::try_create(pool, element_id, input).await {
                Ok(insert) => return Ok(insert),
                Err(err)
                    if attempt < MAX_ALLOCATION_ATTEMPTS && is_version_conflict(&err) =>
                {
                    tracing::debug!(element_id, attempt, "version number taken, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_create(
        pool: &PgPool,
        element_id: DbId,
        input: &CreateElementVersion,
    ) -> Result<VersionInsert, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(parent_id) = input.parent_version_id {
            let parent_element: Option<DbId> = sqlx::query_scalar(
                "SELECT element_id FROM element_versions WHERE id = $1",
            )
            .bind(parent_id)
            .fetch_optional(&mut *tx)
            .await?;
            if parent_element != Some(element_id) {
                return Ok(VersionInsert::InvalidParent(parent_id));
            }
        }

        let next_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) + 1 \
             FROM element_versions WHERE element_id = $1",
        )
        .bind(element_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO element_versions \
                 (element_id, version_number, parent_version_id, source, \
                  prompt, attributes, asset_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        let version = sqlx::query_as::<_, ElementVersion>(&query)
            .bind(element_id)
            .bind(next_number)
            .bind(input.parent_version_id)
            .bind(&input.source)
            .bind(&input.prompt)
            .bind(&input.attributes)
            .bind(input.asset_id)
            .bind(&input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE elements SET latest_version_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(element_id)
        .bind(version.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(VersionInsert::Created(version))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ElementVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM element_versions WHERE id = $1");
        sqlx::query_as::<_, ElementVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_element(
        pool: &PgPool,
        element_id: DbId,
    ) -> Result<Vec<ElementVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM element_versions \
             WHERE element_id = $1 ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, ElementVersion>(&query)
            .bind(element_id)
            .fetch_all(pool)
            .await
    }
}

fn is_version_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|name| name == VERSION_CONSTRAINT)
}
