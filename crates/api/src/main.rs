use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidnova_api::config::{ServerConfig, StorageConfig};
use vidnova_api::{background, routes, state};
use vidnova_pipeline::VideoGenerator;
use vidnova_storage::{MirrorService, S3Store, S3StoreConfig};
use vidnova_veo::{
    MetadataTokenProvider, StaticTokenProvider, TokenProvider, VeoClient, VeoConfig,
};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidnova_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = vidnova_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    vidnova_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    vidnova_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Storage (primary + mirror) ---
    let mirror = Arc::new(build_mirror_service(&config.storage).await);
    tracing::info!(
        primary_bucket = %config.storage.primary_bucket,
        mirror_bucket = %config.storage.mirror_bucket,
        "Object stores configured"
    );

    // --- Veo client ---
    let veo_config = VeoConfig::from_env().expect("Veo configuration missing");
    let tokens = build_token_provider();
    let veo: Arc<dyn vidnova_veo::OperationClient> =
        Arc::new(VeoClient::new(veo_config, tokens));
    tracing::info!("Veo client configured");

    // --- Generator ---
    let generator = Arc::new(VideoGenerator::new(
        Arc::clone(&veo),
        Arc::clone(&mirror),
        config.storage.output_bucket.clone(),
        Duration::from_secs(config.poll_timeout_secs),
        Duration::from_secs(config.poll_interval_secs),
    ));

    // --- In-process sweeper (optional; cron can drive it instead) ---
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweep_handle = if config.sweep_task_enabled {
        let handle = tokio::spawn(background::sweeper::run(
            pool.clone(),
            Arc::clone(&veo),
            Duration::from_secs(config.sweep_interval_secs),
            sweep_cancel.clone(),
        ));
        tracing::info!("In-process sweep task enabled");
        Some(handle)
    } else {
        None
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        generator,
        mirror,
        veo,
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout; must exceed the synchronous poll budget.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if let Some(handle) = sweep_handle {
        sweep_cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Sweep task stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Build the mirror service over the primary and provider-side buckets.
/// The mirror side talks to GCS through its S3 interoperability
/// endpoint, so both sides use the same store implementation.
async fn build_mirror_service(storage: &StorageConfig) -> MirrorService {
    let primary = S3Store::new(S3StoreConfig {
        endpoint: storage.primary_endpoint.clone(),
        region: storage.primary_region.clone(),
        access_key_id: storage.primary_access_key_id.clone(),
        secret_access_key: storage.primary_secret_access_key.clone(),
        force_path_style: true,
    })
    .await;

    let mirror = S3Store::new(S3StoreConfig {
        endpoint: storage.mirror_endpoint.clone(),
        region: storage.mirror_region.clone(),
        access_key_id: storage.mirror_access_key_id.clone(),
        secret_access_key: storage.mirror_secret_access_key.clone(),
        force_path_style: true,
    })
    .await;

    MirrorService::new(
        Arc::new(primary),
        Arc::new(mirror),
        storage.primary_bucket.clone(),
        storage.mirror_bucket.clone(),
    )
}

/// Pick a token source: a fixed `GCP_ACCESS_TOKEN` when set (local
/// development), otherwise the metadata server.
fn build_token_provider() -> Arc<dyn TokenProvider> {
    match std::env::var("GCP_ACCESS_TOKEN") {
        Ok(token) if !token.is_empty() => {
            tracing::warn!("Using static GCP access token from environment");
            Arc::new(StaticTokenProvider(token))
        }
        _ => Arc::new(MetadataTokenProvider::new()),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
