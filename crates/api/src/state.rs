use std::sync::Arc;

use vidnova_pipeline::VideoGenerator;
use vidnova_storage::MirrorService;
use vidnova_veo::OperationClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: vidnova_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generation orchestrator (submit, poll, persist).
    pub generator: Arc<VideoGenerator>,
    /// Mirror service, also used to sign output URLs on read paths.
    pub mirror: Arc<MirrorService>,
    /// Provider client, used directly by the sweep endpoint.
    pub veo: Arc<dyn OperationClient>,
}
