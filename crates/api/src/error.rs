use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use vidnova_core::error::CoreError;
use vidnova_pipeline::GenerationError;
use vidnova_storage::MirrorError;
use vidnova_veo::VeoApiError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors plus the pipeline, mirror, and
/// provider error types. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `vidnova_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A generation pipeline error.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A mirroring/storage error outside the generation flow.
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    /// A provider API error outside the generation flow.
    #[error(transparent)]
    Provider(#[from] VeoApiError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Generation(err) => classify_generation_error(err),
            AppError::Mirror(err) => classify_mirror_error(err),
            AppError::Provider(err) => classify_provider_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
    }
}

fn classify_generation_error(err: &GenerationError) -> (StatusCode, &'static str, String) {
    match err {
        GenerationError::Validation(core) => classify_core_error(core),
        GenerationError::ProjectNotFound(id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("project with id {id} not found"),
        ),
        GenerationError::ElementHasNoAsset(id) => (
            StatusCode::BAD_REQUEST,
            "UNRESOLVED_REFERENCE",
            format!("element {id} has no usable asset"),
        ),
        GenerationError::NoBaseVideo => (
            StatusCode::BAD_REQUEST,
            "NO_BASE_VIDEO",
            "no completed video in this project to build on".to_string(),
        ),
        GenerationError::Mirror(err) => classify_mirror_error(err),
        GenerationError::Provider(err) => classify_provider_error(err),
        GenerationError::Database(err) => classify_sqlx_error(err),
    }
}

fn classify_mirror_error(err: &MirrorError) -> (StatusCode, &'static str, String) {
    match err {
        MirrorError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        MirrorError::Forbidden { entity, id } => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            format!("{entity} {id} belongs to another user"),
        ),
        MirrorError::Transfer(inner) => {
            tracing::error!(error = %inner, "Storage transfer error");
            (
                StatusCode::BAD_GATEWAY,
                "STORAGE_ERROR",
                "Storage transfer failed".to_string(),
            )
        }
        MirrorError::MalformedUri(uri) => {
            tracing::error!(uri, "Malformed output URI");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        MirrorError::Database(err) => classify_sqlx_error(err),
    }
}

fn classify_provider_error(err: &VeoApiError) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Provider error");
    (
        StatusCode::BAD_GATEWAY,
        "PROVIDER_ERROR",
        "The video provider rejected or failed the request".to_string(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Flatten `validator` errors into a single validation message.
pub fn validation_error(errors: &validator::ValidationErrors) -> AppError {
    AppError::Core(CoreError::Validation(errors.to_string()))
}
