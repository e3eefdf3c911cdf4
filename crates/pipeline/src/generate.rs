//! The synchronous generate-and-poll flow.
//!
//! Rows are written in a fixed order so every observable state is
//! consistent: video and version and job are created `queued`, move to
//! `running` only once the provider has accepted the submission, and
//! reach a terminal state exactly once (here or in the sweeper).

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::PgPool;

use vidnova_core::error::CoreError;
use vidnova_core::generation::{
    validate_duration, validate_sample_count, AspectRatio, Resolution, VideoMode,
};
use vidnova_core::mentions::ConversationMessage;
use vidnova_core::types::DbId;
use vidnova_db::models::status::VideoStatus;
use vidnova_db::models::video::CreateVideo;
use vidnova_db::models::video_job::{TerminalOutcome, VideoJob};
use vidnova_db::models::video_version::CreateVideoVersion;
use vidnova_db::repositories::{ProjectRepo, VideoJobRepo, VideoRepo, VideoVersionRepo};
use vidnova_storage::{MirrorError, MirrorService};
use vidnova_veo::{
    poll_until_done, GenerateVideoRequest, MaskInput, MediaInput, OperationClient,
    OperationStatus, VeoApiError,
};

use crate::references::{
    build_registries, collect_reference_sources, resolve_references, ResolvedReferences,
};

/// Mask interpretation sent with inpaint requests.
const MASK_MODE: &str = "MASK_MODE_USER_PROVIDED";

/// How long signed preview URLs stay valid.
const PREVIEW_URL_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("project {0} not found")]
    ProjectNotFound(DbId),

    #[error("element {0} has no usable asset")]
    ElementHasNoAsset(DbId),

    #[error("no completed video in this project to build on")]
    NoBaseVideo,

    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error(transparent)]
    Provider(#[from] VeoApiError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Everything a generation request carries.
#[derive(Debug, Clone)]
pub struct GenerateVideoParams {
    pub project_id: DbId,
    /// Attach the new version to an existing video, or create one.
    pub video_id: Option<DbId>,
    pub title: Option<String>,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub mode: VideoMode,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub duration_seconds: i32,
    pub generate_audio: bool,
    pub sample_count: i32,
    /// `asset:<id>` / `upload:<id>` tokens locked by the client.
    pub pinned_references: Vec<String>,
    /// Labels the client explicitly marked as reference images.
    pub reference_labels: Vec<String>,
    pub image_upload_id: Option<DbId>,
    pub last_frame_upload_id: Option<DbId>,
    pub mask_upload_id: Option<DbId>,
    pub history: Vec<ConversationMessage>,
}

/// What the caller gets back, whether the job finished in the poll
/// budget or is still running.
#[derive(Debug, Clone, Serialize)]
pub struct JobHandle {
    pub status: String,
    pub job_id: DbId,
    pub video_id: DbId,
    pub version_id: DbId,
    pub operation_name: Option<String>,
    pub output_gcs_uris: Vec<String>,
    pub preview_urls: Vec<String>,
    pub error: Option<String>,
}

/// Orchestrates one generation end to end.
pub struct VideoGenerator {
    client: Arc<dyn OperationClient>,
    mirror: Arc<MirrorService>,
    /// Bucket the provider writes outputs into.
    output_bucket: String,
    poll_timeout: Duration,
    poll_interval: Duration,
}

impl VideoGenerator {
    pub fn new(
        client: Arc<dyn OperationClient>,
        mirror: Arc<MirrorService>,
        output_bucket: String,
        poll_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            mirror,
            output_bucket,
            poll_timeout,
            poll_interval,
        }
    }

    /// Run one generation. Validation failures return before any row is
    /// written; failures after row creation leave the version and job
    /// `failed` with the error recorded.
    pub async fn generate(
        &self,
        pool: &PgPool,
        user_id: &str,
        params: &GenerateVideoParams,
    ) -> Result<JobHandle, GenerationError> {
        validate_duration(params.duration_seconds)?;
        validate_sample_count(params.sample_count)?;

        let (uploads, assets) = build_registries(&params.history);
        let sources = collect_reference_sources(
            &params.pinned_references,
            &params.reference_labels,
            &params.prompt,
            &params.history,
            &uploads,
            &assets,
        );
        let mode = resolve_mode(params, !sources.is_empty());
        validate_mode_inputs(mode, params)?;

        ProjectRepo::find_owned(pool, params.project_id, user_id)
            .await?
            .ok_or(GenerationError::ProjectNotFound(params.project_id))?;

        // Extension and inpaint build on the project's latest finished
        // output; fail fast if there is none.
        let base_video = match mode {
            VideoMode::VideoExtension | VideoMode::Inpaint => {
                Some(self.find_base_video(pool, params.project_id).await?)
            }
            _ => None,
        };

        let video = match params.video_id {
            Some(video_id) => VideoRepo::find_by_id(pool, video_id)
                .await?
                .filter(|v| v.user_id == user_id && v.project_id == params.project_id)
                .ok_or(GenerationError::ProjectNotFound(params.project_id))?,
            None => {
                VideoRepo::create(
                    pool,
                    user_id,
                    &CreateVideo {
                        project_id: params.project_id,
                        title: params.title.clone(),
                    },
                )
                .await?
            }
        };

        let version = VideoVersionRepo::create(
            pool,
            &CreateVideoVersion {
                user_id: user_id.to_string(),
                project_id: params.project_id,
                video_id: video.id,
                prompt: params.prompt.clone(),
                negative_prompt: params.negative_prompt.clone(),
                mode: mode.as_str().to_string(),
                aspect_ratio: params.aspect_ratio.as_str().to_string(),
                duration_seconds: params.duration_seconds,
                resolution: params.resolution.as_str().to_string(),
                generate_audio: params.generate_audio,
                sample_count: params.sample_count,
            },
        )
        .await?;

        let job = VideoJobRepo::create(
            pool,
            user_id,
            params.project_id,
            version.id,
            &serde_json::json!({}),
        )
        .await?;

        // From here on failures must land on the rows, not just the caller.
        match self
            .submit_and_poll(
                pool, user_id, params, mode, &job, video.id, version.id, base_video, sources,
            )
            .await
        {
            Ok(handle) => Ok(handle),
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(job_id = job.id, error = %message, "generation failed before completion");
                VideoJobRepo::mark_failed_before_running(pool, job.id, &message).await?;
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit_and_poll(
        &self,
        pool: &PgPool,
        user_id: &str,
        params: &GenerateVideoParams,
        mode: VideoMode,
        job: &VideoJob,
        video_id: DbId,
        version_id: DbId,
        base_video: Option<MediaInput>,
        sources: Vec<crate::references::ReferenceSource>,
    ) -> Result<JobHandle, GenerationError> {
        let references = resolve_references(
            pool,
            &self.mirror,
            user_id,
            params.project_id,
            &sources,
        )
        .await?;

        let request = self
            .build_request(
                pool, user_id, params, mode, &references, base_video, video_id, version_id,
            )
            .await?;
        let request_body = request.to_body();

        VideoVersionRepo::set_request_details(
            pool,
            version_id,
            &serde_json::json!(references.asset_ids),
            &serde_json::json!(references.upload_ids),
            &request_body,
        )
        .await?;

        let operation_name = self.client.submit(&request).await?;
        VideoJobRepo::mark_running(pool, job.id, &operation_name, &request_body).await?;
        tracing::info!(job_id = job.id, %operation_name, "generation running");

        let polled = poll_until_done(
            self.client.as_ref(),
            &operation_name,
            self.poll_timeout,
            self.poll_interval,
        )
        .await;

        match polled {
            Ok(Some(status)) => {
                self.finish(pool, job, video_id, version_id, &operation_name, status)
                    .await
            }
            Ok(None) => {
                tracing::info!(job_id = job.id, "poll budget exhausted, sweeper takes over");
                Ok(self.running_handle(job, video_id, version_id, &operation_name))
            }
            Err(err) => {
                // The operation may still complete; leave it to the sweeper.
                tracing::warn!(job_id = job.id, error = %err, "polling failed, sweeper takes over");
                Ok(self.running_handle(job, video_id, version_id, &operation_name))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn build_request(
        &self,
        pool: &PgPool,
        user_id: &str,
        params: &GenerateVideoParams,
        mode: VideoMode,
        references: &ResolvedReferences,
        base_video: Option<MediaInput>,
        video_id: DbId,
        version_id: DbId,
    ) -> Result<GenerateVideoRequest, GenerationError> {
        let mirror_upload = |upload_id: DbId| {
            self.mirror
                .ensure_upload_mirrored(pool, upload_id, user_id, params.project_id)
        };

        let image = match params.image_upload_id {
            Some(id) => {
                let mirrored = mirror_upload(id).await?;
                Some(MediaInput {
                    gcs_uri: mirrored.gcs_uri,
                    mime_type: mirrored.mime_type,
                })
            }
            None => None,
        };
        let last_frame = match params.last_frame_upload_id {
            Some(id) => {
                let mirrored = mirror_upload(id).await?;
                Some(MediaInput {
                    gcs_uri: mirrored.gcs_uri,
                    mime_type: mirrored.mime_type,
                })
            }
            None => None,
        };
        let mask = match (mode, params.mask_upload_id) {
            (VideoMode::Inpaint, Some(id)) => {
                let mirrored = mirror_upload(id).await?;
                Some(MaskInput {
                    gcs_uri: mirrored.gcs_uri,
                    mime_type: mirrored.mime_type,
                    mask_mode: Some(MASK_MODE.to_string()),
                })
            }
            _ => None,
        };

        let storage_uri = format!(
            "gs://{}/{}/{}/{}/{}/",
            self.output_bucket, user_id, params.project_id, video_id, version_id,
        );

        Ok(GenerateVideoRequest {
            prompt: params.prompt.clone(),
            image,
            last_frame,
            video: base_video,
            mask,
            reference_images: references.images.clone(),
            storage_uri,
            sample_count: params.sample_count as u32,
            duration_seconds: params.duration_seconds as u32,
            generate_audio: params.generate_audio,
            aspect_ratio: params.aspect_ratio,
            resolution: params.resolution,
            negative_prompt: params.negative_prompt.clone(),
        })
    }

    async fn find_base_video(
        &self,
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<MediaInput, GenerationError> {
        let latest = VideoVersionRepo::find_latest_succeeded(pool, project_id)
            .await?
            .ok_or(GenerationError::NoBaseVideo)?;
        let uris: Vec<String> =
            serde_json::from_value(latest.output_gcs_uris).unwrap_or_default();
        let mimes: Vec<String> =
            serde_json::from_value(latest.output_mime_types).unwrap_or_default();
        let gcs_uri = uris.into_iter().next().ok_or(GenerationError::NoBaseVideo)?;
        let mime_type = mimes
            .into_iter()
            .next()
            .unwrap_or_else(|| "video/mp4".to_string());
        Ok(MediaInput { gcs_uri, mime_type })
    }

    async fn finish(
        &self,
        pool: &PgPool,
        job: &VideoJob,
        video_id: DbId,
        version_id: DbId,
        operation_name: &str,
        status: OperationStatus,
    ) -> Result<JobHandle, GenerationError> {
        let outcome = outcome_from_status(&status);
        VideoJobRepo::record_terminal(pool, job.id, &outcome).await?;

        match outcome {
            TerminalOutcome::Succeeded { output_gcs_uris, .. } => {
                let preview_urls = self.sign_outputs(&output_gcs_uris).await;
                Ok(JobHandle {
                    status: VideoStatus::Succeeded.name().to_string(),
                    job_id: job.id,
                    video_id,
                    version_id,
                    operation_name: Some(operation_name.to_string()),
                    output_gcs_uris,
                    preview_urls,
                    error: None,
                })
            }
            TerminalOutcome::Failed { error } => Ok(JobHandle {
                status: VideoStatus::Failed.name().to_string(),
                job_id: job.id,
                video_id,
                version_id,
                operation_name: Some(operation_name.to_string()),
                output_gcs_uris: Vec::new(),
                preview_urls: Vec::new(),
                error: Some(error),
            }),
        }
    }

    async fn sign_outputs(&self, gcs_uris: &[String]) -> Vec<String> {
        let mut urls = Vec::with_capacity(gcs_uris.len());
        for uri in gcs_uris {
            match self.mirror.sign_output_url(uri, PREVIEW_URL_TTL).await {
                Ok(url) => urls.push(url),
                Err(err) => {
                    tracing::warn!(uri, error = %err, "could not sign output URL");
                }
            }
        }
        urls
    }

    fn running_handle(
        &self,
        job: &VideoJob,
        video_id: DbId,
        version_id: DbId,
        operation_name: &str,
    ) -> JobHandle {
        JobHandle {
            status: VideoStatus::Running.name().to_string(),
            job_id: job.id,
            video_id,
            version_id,
            operation_name: Some(operation_name.to_string()),
            output_gcs_uris: Vec::new(),
            preview_urls: Vec::new(),
            error: None,
        }
    }
}

/// Map a finished provider operation to the outcome we persist.
pub fn outcome_from_status(status: &OperationStatus) -> TerminalOutcome {
    if let Some(error) = &status.error {
        return TerminalOutcome::Failed {
            error: error.clone(),
        };
    }
    if status.videos.is_empty() {
        return TerminalOutcome::Failed {
            error: "operation finished without outputs".to_string(),
        };
    }
    TerminalOutcome::Succeeded {
        output_gcs_uris: status.videos.iter().map(|v| v.gcs_uri.clone()).collect(),
        output_mime_types: status.videos.iter().map(|v| v.mime_type.clone()).collect(),
        response: status.raw.clone(),
    }
}

/// Pick a concrete mode for `Auto` requests from the inputs present.
fn resolve_mode(params: &GenerateVideoParams, has_references: bool) -> VideoMode {
    match params.mode {
        VideoMode::Auto => {
            if params.image_upload_id.is_some() && params.last_frame_upload_id.is_some() {
                VideoMode::FrameInterpolation
            } else if params.image_upload_id.is_some() {
                VideoMode::ImageToVideo
            } else if has_references {
                VideoMode::ReferencesToVideo
            } else {
                VideoMode::TextToVideo
            }
        }
        other => other,
    }
}

/// Structural checks that must fail before any row is written.
fn validate_mode_inputs(
    mode: VideoMode,
    params: &GenerateVideoParams,
) -> Result<(), CoreError> {
    match mode {
        VideoMode::Inpaint if params.mask_upload_id.is_none() => Err(CoreError::Validation(
            "Inpaint requests require a mask".to_string(),
        )),
        VideoMode::FrameInterpolation
            if params.image_upload_id.is_none() || params.last_frame_upload_id.is_none() =>
        {
            Err(CoreError::Validation(
                "Frame interpolation requires a first and last frame".to_string(),
            ))
        }
        VideoMode::ImageToVideo if params.image_upload_id.is_none() => {
            Err(CoreError::Validation(
                "Image-to-video requires a start image".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mode: VideoMode) -> GenerateVideoParams {
        GenerateVideoParams {
            project_id: 1,
            video_id: None,
            title: None,
            prompt: "a fox".to_string(),
            negative_prompt: None,
            mode,
            aspect_ratio: AspectRatio::Landscape,
            resolution: Resolution::R720p,
            duration_seconds: 8,
            generate_audio: true,
            sample_count: 1,
            pinned_references: Vec::new(),
            reference_labels: Vec::new(),
            image_upload_id: None,
            last_frame_upload_id: None,
            mask_upload_id: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn auto_mode_picks_from_inputs() {
        let mut p = params(VideoMode::Auto);
        assert_eq!(resolve_mode(&p, false), VideoMode::TextToVideo);
        assert_eq!(resolve_mode(&p, true), VideoMode::ReferencesToVideo);

        p.image_upload_id = Some(1);
        assert_eq!(resolve_mode(&p, false), VideoMode::ImageToVideo);

        p.last_frame_upload_id = Some(2);
        assert_eq!(resolve_mode(&p, false), VideoMode::FrameInterpolation);
    }

    #[test]
    fn explicit_mode_is_kept() {
        let p = params(VideoMode::VideoExtension);
        assert_eq!(resolve_mode(&p, true), VideoMode::VideoExtension);
    }

    #[test]
    fn inpaint_without_mask_is_rejected() {
        let p = params(VideoMode::Inpaint);
        assert!(validate_mode_inputs(VideoMode::Inpaint, &p).is_err());
    }

    #[test]
    fn interpolation_requires_both_frames() {
        let mut p = params(VideoMode::FrameInterpolation);
        p.image_upload_id = Some(1);
        assert!(validate_mode_inputs(VideoMode::FrameInterpolation, &p).is_err());
        p.last_frame_upload_id = Some(2);
        assert!(validate_mode_inputs(VideoMode::FrameInterpolation, &p).is_ok());
    }

    #[test]
    fn finished_status_without_outputs_is_a_failure() {
        let status = OperationStatus::from_raw(serde_json::json!({
            "done": true,
            "response": {"videos": []}
        }));
        let outcome = outcome_from_status(&status);
        assert!(matches!(outcome, TerminalOutcome::Failed { .. }));
    }
}
