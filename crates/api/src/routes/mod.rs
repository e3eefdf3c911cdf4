pub mod cron;
pub mod elements;
pub mod health;
pub mod projects;
pub mod uploads;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", projects::router())
        .nest("/elements", elements::router())
        .nest("/uploads", uploads::router())
        .nest("/videos", videos::router())
        .nest("/cron", cron::router())
}
