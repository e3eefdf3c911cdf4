//! Repository for the `videos` table.

use sqlx::PgPool;
use vidnova_core::types::DbId;

use crate::models::video::{CreateVideo, Video};

const COLUMNS: &str = "id, user_id, project_id, title, created_at, updated_at";

pub struct VideoRepo;

impl VideoRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        input: &CreateVideo,
    ) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (user_id, project_id, title) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(user_id)
            .bind(input.project_id)
            .bind(&input.title)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM videos WHERE project_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
