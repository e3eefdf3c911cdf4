//! Handlers for video generation and the rows it produces.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use vidnova_core::error::CoreError;
use vidnova_core::generation::{AspectRatio, Resolution, VideoMode, DEFAULT_DURATION_SECS};
use vidnova_core::mentions::ConversationMessage;
use vidnova_core::types::DbId;
use vidnova_db::models::status::VideoStatus;
use vidnova_db::models::video::Video;
use vidnova_db::models::video_version::VideoVersion;
use vidnova_db::repositories::{ProjectRepo, VideoJobRepo, VideoRepo, VideoVersionRepo};
use vidnova_pipeline::{GenerateVideoParams, JobHandle};

use crate::error::{validation_error, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// How long signed preview URLs from the job-handle endpoint stay valid.
const PREVIEW_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Body of `POST /videos/generate`. Everything except `project_id` and
/// `prompt` has a sensible default.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateVideoBody {
    pub project_id: DbId,
    pub video_id: Option<DbId>,
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub mode: VideoMode,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_duration")]
    pub duration_seconds: i32,
    #[serde(default = "default_generate_audio")]
    pub generate_audio: bool,
    #[serde(default = "default_sample_count")]
    pub sample_count: i32,
    #[serde(default)]
    pub pinned_references: Vec<String>,
    #[serde(default)]
    pub reference_labels: Vec<String>,
    pub image_upload_id: Option<DbId>,
    pub last_frame_upload_id: Option<DbId>,
    pub mask_upload_id: Option<DbId>,
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
}

fn default_duration() -> i32 {
    DEFAULT_DURATION_SECS
}

fn default_generate_audio() -> bool {
    true
}

fn default_sample_count() -> i32 {
    1
}

/// POST /api/v1/videos/generate
///
/// Runs the full generate flow: validate, resolve references, submit to
/// the provider, and poll within the request budget. Returns a handle
/// that is terminal if the operation finished in time, `running`
/// otherwise (the sweeper completes it later).
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<GenerateVideoBody>,
) -> AppResult<(StatusCode, Json<JobHandle>)> {
    body.validate().map_err(|e| validation_error(&e))?;

    let params = GenerateVideoParams {
        project_id: body.project_id,
        video_id: body.video_id,
        title: body.title,
        prompt: body.prompt,
        negative_prompt: body.negative_prompt,
        mode: body.mode,
        aspect_ratio: body.aspect_ratio,
        resolution: body.resolution,
        duration_seconds: body.duration_seconds,
        generate_audio: body.generate_audio,
        sample_count: body.sample_count,
        pinned_references: body.pinned_references,
        reference_labels: body.reference_labels,
        image_upload_id: body.image_upload_id,
        last_frame_upload_id: body.last_frame_upload_id,
        mask_upload_id: body.mask_upload_id,
        history: body.history,
    };

    let handle = state
        .generator
        .generate(&state.pool, &user.user_id, &params)
        .await?;
    Ok((StatusCode::CREATED, Json(handle)))
}

/// GET /api/v1/videos/jobs/{id}
///
/// Rebuild a job handle from the stored rows. Outputs come from the
/// version row; preview URLs are re-signed on every read.
pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<JobHandle>> {
    let job = VideoJobRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|j| j.user_id == user.user_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VideoJob",
            id,
        }))?;

    let version = VideoVersionRepo::find_by_id(&state.pool, job.video_version_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VideoVersion",
            id: job.video_version_id,
        }))?;

    let status = VideoStatus::from_id(job.status_id).unwrap_or(VideoStatus::Queued);
    let output_gcs_uris: Vec<String> =
        serde_json::from_value(version.output_gcs_uris.clone()).unwrap_or_default();

    let mut preview_urls = Vec::new();
    if status == VideoStatus::Succeeded {
        for uri in &output_gcs_uris {
            match state.mirror.sign_output_url(uri, PREVIEW_URL_TTL).await {
                Ok(url) => preview_urls.push(url),
                Err(err) => {
                    tracing::warn!(uri, error = %err, "could not sign output URL");
                }
            }
        }
    }

    Ok(Json(JobHandle {
        status: status.name().to_string(),
        job_id: job.id,
        video_id: version.video_id,
        version_id: version.id,
        operation_name: job.operation_name,
        output_gcs_uris,
        preview_urls,
        error: job.error,
    }))
}

/// GET /api/v1/projects/{project_id}/videos
pub async fn list_by_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<Vec<Video>>> {
    ProjectRepo::find_owned(&state.pool, project_id, &user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    let videos = VideoRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(videos))
}

/// GET /api/v1/videos/{id}/versions
pub async fn list_versions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<VideoVersion>>> {
    VideoRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|v| v.user_id == user.user_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id,
        }))?;

    let versions = VideoVersionRepo::list_by_video(&state.pool, id).await?;
    Ok(Json(versions))
}
