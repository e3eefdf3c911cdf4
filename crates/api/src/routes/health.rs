//! Health check route.
//!
//! | Method | Path      | Description                        |
//! |--------|-----------|------------------------------------|
//! | GET    | `/health` | Liveness and database connectivity |

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    vidnova_db::health_check(&state.pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
