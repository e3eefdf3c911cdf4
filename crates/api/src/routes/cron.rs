//! Cron routes, authenticated with the shared cron secret.
//!
//! | Method | Path          | Description                           |
//! |--------|---------------|---------------------------------------|
//! | POST   | `/video-jobs` | Run one sweep pass over running jobs  |

use axum::routing::post;
use axum::Router;

use crate::handlers::sweep;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/video-jobs", post(sweep::sweep))
}
