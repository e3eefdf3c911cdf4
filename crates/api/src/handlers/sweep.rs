//! Handler for the cron-triggered sweep endpoint.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use vidnova_core::error::CoreError;
use vidnova_pipeline::SweepReport;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/cron/video-jobs
///
/// Authenticated with the shared cron secret instead of a user JWT:
/// `Authorization: Bearer <CRON_SECRET>`.
pub async fn sweep(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<SweepReport>> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    if token != state.config.cron_secret {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid cron secret".into(),
        )));
    }

    let report = vidnova_pipeline::sweep(&state.pool, state.veo.as_ref()).await?;
    tracing::info!(
        checked = report.checked,
        completed = report.completed,
        failed = report.failed,
        still_running = report.still_running,
        "sweep pass finished"
    );
    Ok(Json(report))
}
