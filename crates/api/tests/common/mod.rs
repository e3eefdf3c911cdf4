//! Shared helpers for API integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use vidnova_api::auth::jwt::{generate_access_token, JwtConfig};
use vidnova_api::config::{ServerConfig, StorageConfig};
use vidnova_api::routes;
use vidnova_api::state::AppState;
use vidnova_pipeline::VideoGenerator;
use vidnova_storage::{MirrorService, ObjectBody, ObjectStore, StorageError};
use vidnova_veo::{GenerateVideoRequest, OperationClient, OperationStatus, VeoApiError};

pub const CRON_SECRET: &str = "test-cron-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
        cron_secret: CRON_SECRET.to_string(),
        poll_timeout_secs: 1,
        poll_interval_secs: 6,
        sweep_task_enabled: false,
        sweep_interval_secs: 60,
        storage: StorageConfig {
            primary_endpoint: "http://localhost:9000".to_string(),
            primary_region: "auto".to_string(),
            primary_bucket: "primary-bucket".to_string(),
            primary_access_key_id: "test".to_string(),
            primary_secret_access_key: "test".to_string(),
            mirror_endpoint: "http://localhost:9001".to_string(),
            mirror_region: "auto".to_string(),
            mirror_bucket: "mirror-bucket".to_string(),
            mirror_access_key_id: "test".to_string(),
            mirror_secret_access_key: "test".to_string(),
            output_bucket: "out-bucket".to_string(),
        },
    }
}

/// Provider stub: submission always accepted, operations finish on the
/// first fetch with one output video.
pub struct InstantProvider;

#[async_trait]
impl OperationClient for InstantProvider {
    async fn submit(&self, _request: &GenerateVideoRequest) -> Result<String, VeoApiError> {
        Ok("operations/test-op-1".to_string())
    }

    async fn fetch_operation(
        &self,
        operation_name: &str,
    ) -> Result<OperationStatus, VeoApiError> {
        Ok(OperationStatus::from_raw(serde_json::json!({
            "name": operation_name,
            "done": true,
            "response": {
                "videos": [
                    {"gcsUri": "gs://out-bucket/sample_0.mp4", "mimeType": "video/mp4"}
                ]
            }
        })))
    }
}

/// Object store stub: single-object reads, no-op writes, fake signing.
pub struct NullStore;

#[async_trait]
impl ObjectStore for NullStore {
    async fn download(&self, _bucket: &str, _key: &str) -> Result<ObjectBody, StorageError> {
        Ok(ObjectBody {
            bytes: vec![0u8; 4],
            mime_type: Some("image/png".to_string()),
        })
    }

    async fn upload(
        &self,
        _bucket: &str,
        _key: &str,
        _bytes: Vec<u8>,
        _mime_type: &str,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!("https://signed.test/{bucket}/{key}"))
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool and a provider stub. Mirrors the router
/// construction in `main.rs` so tests exercise the same middleware
/// stack production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let mirror = Arc::new(MirrorService::new(
        Arc::new(NullStore),
        Arc::new(NullStore),
        config.storage.primary_bucket.clone(),
        config.storage.mirror_bucket.clone(),
    ));
    let veo: Arc<dyn OperationClient> = Arc::new(InstantProvider);
    let generator = Arc::new(VideoGenerator::new(
        Arc::clone(&veo),
        Arc::clone(&mirror),
        config.storage.output_bucket.clone(),
        Duration::from_secs(config.poll_timeout_secs),
        Duration::from_secs(config.poll_interval_secs),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config),
        generator,
        mirror,
        veo,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Issue a valid access token for the given user.
pub fn token_for(user_id: &str) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
