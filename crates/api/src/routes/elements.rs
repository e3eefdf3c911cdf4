//! Element routes.
//!
//! | Method | Path                          | Description                           |
//! |--------|-------------------------------|---------------------------------------|
//! | POST   | `/`                           | Create an element                     |
//! | GET    | `/`                           | List the caller's elements            |
//! | GET    | `/{id}`                       | Get one element                       |
//! | PATCH  | `/{id}`                       | Update an element                     |
//! | DELETE | `/{id}`                       | Delete an element                     |
//! | GET    | `/{id}/versions`              | List an element's versions            |
//! | POST   | `/{id}/versions`              | Create the next element version       |
//! | POST   | `/{id}/versions/from-upload`  | Promote an upload into a new version  |

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::elements;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(elements::list).post(elements::create))
        .route(
            "/{id}",
            get(elements::get_by_id)
                .patch(elements::update)
                .delete(elements::delete),
        )
        .route(
            "/{id}/versions",
            get(elements::list_versions).post(elements::create_version),
        )
        .route(
            "/{id}/versions/from-upload",
            post(elements::create_version_from_upload),
        )
}
