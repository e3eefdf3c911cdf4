//! Upload routes.
//!
//! | Method | Path         | Description                          |
//! |--------|--------------|--------------------------------------|
//! | POST   | `/`          | Register an uploaded file            |
//! | GET    | `/`          | List the caller's uploads            |
//! | GET    | `/{id}`      | Get one upload                       |
//! | GET    | `/{id}/url`  | Mint a signed read URL for an upload |

use axum::routing::get;
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(uploads::list).post(uploads::register))
        .route("/{id}", get(uploads::get_by_id))
        .route("/{id}/url", get(uploads::signed_url))
}
