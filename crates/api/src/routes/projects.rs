//! Project routes.
//!
//! | Method | Path            | Description                     |
//! |--------|-----------------|---------------------------------|
//! | POST   | `/`             | Create a project                |
//! | GET    | `/`             | List the caller's projects      |
//! | GET    | `/{id}`         | Get one project                 |
//! | GET    | `/{id}/videos`  | List the videos in a project    |

use axum::routing::get;
use axum::Router;

use crate::handlers::{projects, videos};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list).post(projects::create))
        .route("/{id}", get(projects::get_by_id))
        .route("/{id}/videos", get(videos::list_by_project))
}
