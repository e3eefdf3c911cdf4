//! Video generation routes.
//!
//! | Method | Path              | Description                             |
//! |--------|-------------------|-----------------------------------------|
//! | POST   | `/generate`       | Run a generation (submit, poll, return) |
//! | GET    | `/jobs/{id}`      | Get the handle for a generation job     |
//! | GET    | `/{id}/versions`  | List the versions of a video            |

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::videos;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(videos::generate))
        .route("/jobs/{id}", get(videos::get_job))
        .route("/{id}/versions", get(videos::list_versions))
}
