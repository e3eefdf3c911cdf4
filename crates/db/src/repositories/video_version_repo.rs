//! Repository for the `video_versions` table.

use sqlx::PgPool;
use vidnova_core::types::DbId;

use crate::models::status::VideoStatus;
use crate::models::video_version::{CreateVideoVersion, VideoVersion};

const COLUMNS: &str = "\
    id, user_id, project_id, video_id, prompt, negative_prompt, mode, \
    aspect_ratio, duration_seconds, resolution, generate_audio, sample_count, \
    reference_asset_ids, reference_upload_ids, request, \
    output_gcs_uris, output_mime_types, status_id, error, \
    created_at, updated_at";

pub struct VideoVersionRepo;

impl VideoVersionRepo {
    /// Create a version in `queued` state. It stays queued until the
    /// provider accepts the job; the transition to `running` happens
    /// together with the job row in `VideoJobRepo::mark_running`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateVideoVersion,
    ) -> Result<VideoVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_versions \
                 (user_id, project_id, video_id, prompt, negative_prompt, mode, \
                  aspect_ratio, duration_seconds, resolution, generate_audio, \
                  sample_count, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoVersion>(&query)
            .bind(&input.user_id)
            .bind(input.project_id)
            .bind(input.video_id)
            .bind(&input.prompt)
            .bind(&input.negative_prompt)
            .bind(&input.mode)
            .bind(&input.aspect_ratio)
            .bind(input.duration_seconds)
            .bind(&input.resolution)
            .bind(input.generate_audio)
            .bind(input.sample_count)
            .bind(VideoStatus::Queued.id())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<VideoVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM video_versions WHERE id = $1");
        sqlx::query_as::<_, VideoVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_video(
        pool: &PgPool,
        video_id: DbId,
    ) -> Result<Vec<VideoVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_versions \
             WHERE video_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, VideoVersion>(&query)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }

    /// Record which stored media the request referenced, plus the exact
    /// provider request body, once reference resolution has finished.
    pub async fn set_request_details(
        pool: &PgPool,
        id: DbId,
        reference_asset_ids: &serde_json::Value,
        reference_upload_ids: &serde_json::Value,
        request: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE video_versions \
             SET reference_asset_ids = $2, reference_upload_ids = $3, \
                 request = $4, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(reference_asset_ids)
        .bind(reference_upload_ids)
        .bind(request)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Latest succeeded version in a project, used as the base video for
    /// extension and inpaint requests.
    pub async fn find_latest_succeeded(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<VideoVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_versions \
             WHERE project_id = $1 AND status_id = $2 \
             ORDER BY updated_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, VideoVersion>(&query)
            .bind(project_id)
            .bind(VideoStatus::Succeeded.id())
            .fetch_optional(pool)
            .await
    }
}
