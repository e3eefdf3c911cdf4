//! Repository for the `video_jobs` table.
//!
//! Jobs and their video versions move through the lifecycle together:
//! every transition here updates both rows in one transaction so a
//! crash can never leave them disagreeing.

use sqlx::{PgPool, Postgres, Transaction};
use vidnova_core::types::DbId;

use crate::models::status::VideoStatus;
use crate::models::video_job::{TerminalApply, TerminalOutcome, VideoJob};

const COLUMNS: &str = "\
    id, user_id, project_id, video_version_id, provider, operation_name, \
    status_id, request, response, error, poll_error_count, \
    created_at, updated_at";

/// How many jobs one sweep pass picks up.
pub const SWEEP_BATCH_SIZE: i64 = 10;

pub struct VideoJobRepo;

impl VideoJobRepo {
    /// Create a job in `queued` state with no operation name. The name
    /// is only known once the provider accepts the submission.
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        project_id: DbId,
        video_version_id: DbId,
        request: &serde_json::Value,
    ) -> Result<VideoJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_jobs \
                 (user_id, project_id, video_version_id, status_id, request) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoJob>(&query)
            .bind(user_id)
            .bind(project_id)
            .bind(video_version_id)
            .bind(VideoStatus::Queued.id())
            .bind(request)
            .fetch_one(pool)
            .await
    }

    /// Record a successful provider submission: store the operation name
    /// and move job and version to `running` together.
    pub async fn mark_running(
        pool: &PgPool,
        job_id: DbId,
        operation_name: &str,
        request: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let version_id: DbId = sqlx::query_scalar(
            "UPDATE video_jobs \
             SET operation_name = $2, status_id = $3, request = $4, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING video_version_id",
        )
        .bind(job_id)
        .bind(operation_name)
        .bind(VideoStatus::Running.id())
        .bind(request)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE video_versions SET status_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(version_id)
        .bind(VideoStatus::Running.id())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fail a job that never reached the provider (validation, mirroring,
    /// or submit errors). Job and version go to `failed` together.
    pub async fn mark_failed_before_running(
        pool: &PgPool,
        job_id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let version_id: DbId = sqlx::query_scalar(
            "UPDATE video_jobs \
             SET status_id = $2, error = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING video_version_id",
        )
        .bind(job_id)
        .bind(VideoStatus::Failed.id())
        .bind(error)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE video_versions \
             SET status_id = $2, error = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(version_id)
        .bind(VideoStatus::Failed.id())
        .bind(error)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Apply a terminal outcome observed from the provider.
    ///
    /// Locks the job row first so the synchronous poll loop and the
    /// sweeper cannot race. Idempotent: a repeat observation of the same
    /// outcome is a `Noop`; a terminal job seeing a different outcome
    /// reports `Conflict` and leaves the rows untouched.
    pub async fn record_terminal(
        pool: &PgPool,
        job_id: DbId,
        outcome: &TerminalOutcome,
    ) -> Result<TerminalApply, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row: (DbId, i16) = sqlx::query_as(
            "SELECT video_version_id, status_id FROM video_jobs WHERE id = $1 FOR UPDATE",
        )
        .bind(job_id)
        .fetch_one(&mut *tx)
        .await?;
        let (version_id, current) = row;

        if let Some(status) = VideoStatus::from_id(current) {
            if status.is_terminal() {
                let same = match (status, outcome) {
                    (VideoStatus::Succeeded, TerminalOutcome::Succeeded { .. }) => true,
                    (VideoStatus::Failed, TerminalOutcome::Failed { .. }) => true,
                    _ => false,
                };
                tx.rollback().await?;
                return Ok(if same {
                    TerminalApply::Noop
                } else {
                    TerminalApply::Conflict
                });
            }
        }

        match outcome {
            TerminalOutcome::Succeeded {
                output_gcs_uris,
                output_mime_types,
                response,
            } => {
                Self::apply_success(
                    &mut tx,
                    job_id,
                    version_id,
                    output_gcs_uris,
                    output_mime_types,
                    response,
                )
                .await?;
            }
            TerminalOutcome::Failed { error } => {
                Self::apply_failure(&mut tx, job_id, version_id, error).await?;
            }
        }

        tx.commit().await?;
        Ok(TerminalApply::Applied)
    }

    async fn apply_success(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
        version_id: DbId,
        output_gcs_uris: &[String],
        output_mime_types: &[String],
        response: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        let uris = serde_json::json!(output_gcs_uris);
        let mimes = serde_json::json!(output_mime_types);

        sqlx::query(
            "UPDATE video_jobs \
             SET status_id = $2, response = $3, error = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(VideoStatus::Succeeded.id())
        .bind(response)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE video_versions \
             SET status_id = $2, output_gcs_uris = $3, output_mime_types = $4, \
                 error = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(version_id)
        .bind(VideoStatus::Succeeded.id())
        .bind(&uris)
        .bind(&mimes)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn apply_failure(
        tx: &mut Transaction<'_, Postgres>,
        job_id: DbId,
        version_id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE video_jobs \
             SET status_id = $2, error = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(VideoStatus::Failed.id())
        .bind(error)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE video_versions \
             SET status_id = $2, error = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(version_id)
        .bind(VideoStatus::Failed.id())
        .bind(error)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<VideoJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM video_jobs WHERE id = $1");
        sqlx::query_as::<_, VideoJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Oldest running jobs with an operation name, up to the sweep batch
    /// size. Jobs still waiting on a submit (no name yet) are skipped.
    pub async fn list_running(pool: &PgPool) -> Result<Vec<VideoJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_jobs \
             WHERE status_id = $1 AND operation_name IS NOT NULL \
             ORDER BY created_at ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, VideoJob>(&query)
            .bind(VideoStatus::Running.id())
            .bind(SWEEP_BATCH_SIZE)
            .fetch_all(pool)
            .await
    }

    /// Bump the consecutive poll error counter; returns the new count.
    pub async fn record_poll_error(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE video_jobs \
             SET poll_error_count = poll_error_count + 1, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING poll_error_count",
        )
        .bind(job_id)
        .fetch_one(pool)
        .await
    }

    /// A successful poll clears the consecutive error counter.
    pub async fn reset_poll_errors(pool: &PgPool, job_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE video_jobs \
             SET poll_error_count = 0, updated_at = NOW() \
             WHERE id = $1 AND poll_error_count <> 0",
        )
        .bind(job_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
