//! Handlers for the `/uploads` resource.
//!
//! Uploads are registered after the file already sits in primary
//! storage; this API records the metadata the pipeline needs to mirror
//! the object to provider storage later.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use vidnova_core::error::CoreError;
use vidnova_core::types::DbId;
use vidnova_db::models::upload::{CreateUserUpload, UserUpload};
use vidnova_db::repositories::UploadRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// POST /api/v1/uploads
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateUserUpload>,
) -> AppResult<(StatusCode, Json<UserUpload>)> {
    if input.storage_path.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Upload storage_path must not be empty".into(),
        )));
    }
    if input.mime_type.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Upload mime_type must not be empty".into(),
        )));
    }
    let upload = UploadRepo::create(&state.pool, &user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(upload)))
}

/// GET /api/v1/uploads
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<UserUpload>>> {
    let uploads = UploadRepo::list_by_user(&state.pool, &user.user_id).await?;
    Ok(Json(uploads))
}

/// GET /api/v1/uploads/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserUpload>> {
    let upload = UploadRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|u| u.user_id == user.user_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Upload",
            id,
        }))?;
    Ok(Json(upload))
}

/// How long signed upload URLs stay valid.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// GET /api/v1/uploads/{id}/url
///
/// Mint a time-limited read URL for the stored object.
pub async fn signed_url(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let upload = UploadRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|u| u.user_id == user.user_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Upload",
            id,
        }))?;

    let url = state
        .mirror
        .sign_primary_url(&upload.storage_path, UPLOAD_URL_TTL)
        .await?;
    Ok(Json(json!({
        "url": url,
        "expires_in_secs": UPLOAD_URL_TTL.as_secs(),
    })))
}
