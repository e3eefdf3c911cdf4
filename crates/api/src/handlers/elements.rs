//! Handlers for the `/elements` resource and its versions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use vidnova_core::error::CoreError;
use vidnova_core::types::DbId;
use vidnova_db::models::asset::CreateAsset;
use vidnova_db::models::element::{CreateElement, Element, UpdateElement};
use vidnova_db::models::element_version::{CreateElementVersion, ElementVersion, VersionInsert};
use vidnova_db::models::status::ElementStatus;
use vidnova_db::repositories::{AssetRepo, ElementRepo, ElementVersionRepo, UploadRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

const ELEMENT_KINDS: &[&str] = &["character", "object", "other"];

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Element",
        id,
    })
}

/// POST /api/v1/elements
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateElement>,
) -> AppResult<(StatusCode, Json<Element>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Element name must not be empty".into(),
        )));
    }
    if !ELEMENT_KINDS.contains(&input.kind.as_str()) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown element kind '{}'. Must be one of: {ELEMENT_KINDS:?}",
            input.kind
        ))));
    }
    let element = ElementRepo::create(&state.pool, &user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(element)))
}

/// GET /api/v1/elements
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Element>>> {
    let elements = ElementRepo::list_by_user(&state.pool, &user.user_id).await?;
    Ok(Json(elements))
}

/// GET /api/v1/elements/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Element>> {
    let element = ElementRepo::find_owned(&state.pool, id, &user.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(element))
}

/// PATCH /api/v1/elements/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateElement>,
) -> AppResult<Json<Element>> {
    ElementRepo::find_owned(&state.pool, id, &user.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let element = ElementRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(element))
}

/// DELETE /api/v1/elements/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ElementRepo::find_owned(&state.pool, id, &user.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;

    if ElementRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// GET /api/v1/elements/{id}/versions
pub async fn list_versions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<ElementVersion>>> {
    ElementRepo::find_owned(&state.pool, id, &user.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let versions = ElementVersionRepo::list_by_element(&state.pool, id).await?;
    Ok(Json(versions))
}

/// POST /api/v1/elements/{id}/versions
pub async fn create_version(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<CreateElementVersion>,
) -> AppResult<(StatusCode, Json<ElementVersion>)> {
    ElementRepo::find_owned(&state.pool, id, &user.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;

    if input.created_by.is_none() {
        input.created_by = Some(user.user_id.clone());
    }
    let version = match ElementVersionRepo::create(&state.pool, id, &input).await? {
        VersionInsert::Created(version) => version,
        VersionInsert::InvalidParent(parent_id) => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "parent_version_id {parent_id} is not a version of element {id}"
            ))));
        }
    };
    Ok((StatusCode::CREATED, Json(version)))
}

/// Request body for promoting an upload into a new element version.
#[derive(Debug, Deserialize)]
pub struct PromoteUploadBody {
    pub upload_id: DbId,
    pub public_url: Option<String>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// POST /api/v1/elements/{id}/versions/from-upload
///
/// Promote an owned upload into the element's next version: the upload
/// becomes an asset row, the new version points at it, and the element's
/// latest pointer, thumbnail, and status advance with it.
pub async fn create_version_from_upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<PromoteUploadBody>,
) -> AppResult<(StatusCode, Json<ElementVersion>)> {
    let element = ElementRepo::find_owned(&state.pool, id, &user.user_id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let upload = UploadRepo::find_by_id(&state.pool, input.upload_id)
        .await?
        .filter(|u| u.user_id == user.user_id)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Upload",
            id: input.upload_id,
        }))?;

    let asset = AssetRepo::create(
        &state.pool,
        &user.user_id,
        &CreateAsset {
            storage_path: upload.storage_path.clone(),
            public_url: input.public_url.clone(),
            mime_type: upload.mime_type.clone(),
            size_bytes: None,
            width: None,
            height: None,
            kind: "image".to_string(),
        },
    )
    .await?;
    // Carry the mirror cache over if the upload was already copied.
    if let Some(gcs_uri) = &upload.gcs_uri {
        AssetRepo::set_gcs_uri(&state.pool, asset.id, gcs_uri).await?;
    }

    let next = CreateElementVersion {
        parent_version_id: element.latest_version_id,
        source: "upload".to_string(),
        prompt: input.prompt,
        attributes: input.attributes,
        asset_id: Some(asset.id),
        created_by: Some(user.user_id.clone()),
    };
    let version = match ElementVersionRepo::create(&state.pool, id, &next).await? {
        VersionInsert::Created(version) => version,
        // latest_version_id always references a version of this element.
        VersionInsert::InvalidParent(parent_id) => {
            return Err(AppError::InternalError(format!(
                "latest version {parent_id} missing for element {id}"
            )));
        }
    };

    ElementRepo::update(
        &state.pool,
        id,
        &UpdateElement {
            name: None,
            summary: None,
            status_id: Some(ElementStatus::Ready.id()),
            thumbnail_url: input.public_url,
            tags: None,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(version)))
}
