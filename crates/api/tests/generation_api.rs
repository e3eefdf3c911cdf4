//! End-to-end generation flow through the HTTP surface, with the
//! provider stubbed to finish on the first poll.

mod common;

use axum::http::StatusCode;
use axum::Router;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, get_auth, post_json, token_for};

async fn create_project(app: Router, token: &str) -> i64 {
    let response = post_json(
        app,
        "/api/v1/projects",
        Some(token),
        json!({"name": "Gen tests"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn generate_returns_succeeded_handle(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = token_for("user-1");
    let project_id = create_project(app.clone(), &token).await;

    let response = post_json(
        app.clone(),
        "/api/v1/videos/generate",
        Some(&token),
        json!({
            "project_id": project_id,
            "prompt": "a fox running through snow",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let handle = body_json(response).await;
    assert_eq!(handle["status"], "succeeded");
    assert_eq!(handle["operation_name"], "operations/test-op-1");
    assert_eq!(
        handle["output_gcs_uris"][0],
        "gs://out-bucket/sample_0.mp4"
    );
    assert!(handle["preview_urls"][0]
        .as_str()
        .unwrap()
        .starts_with("https://signed.test/"));

    // The job handle endpoint rebuilds the same view from the rows.
    let job_id = handle["job_id"].as_i64().unwrap();
    let response = get_auth(app, &format!("/api/v1/videos/jobs/{job_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = body_json(response).await;
    assert_eq!(fetched["status"], "succeeded");
    assert_eq!(fetched["video_id"], handle["video_id"]);
    assert_eq!(
        fetched["output_gcs_uris"][0],
        "gs://out-bucket/sample_0.mp4"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn generate_rejects_invalid_duration(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = token_for("user-1");
    let project_id = create_project(app.clone(), &token).await;

    let response = post_json(
        app,
        "/api/v1/videos/generate",
        Some(&token),
        json!({
            "project_id": project_id,
            "prompt": "a fox",
            "duration_seconds": 5,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn generate_rejects_inpaint_without_mask(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = token_for("user-1");
    let project_id = create_project(app.clone(), &token).await;

    let response = post_json(
        app,
        "/api/v1/videos/generate",
        Some(&token),
        json!({
            "project_id": project_id,
            "prompt": "remove the lamppost",
            "mode": "inpaint",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn generate_into_unknown_project_is_not_found(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/videos/generate",
        Some(&token_for("user-1")),
        json!({
            "project_id": 4242,
            "prompt": "a fox",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn project_videos_and_versions_are_listed(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = token_for("user-1");
    let project_id = create_project(app.clone(), &token).await;

    let response = post_json(
        app.clone(),
        "/api/v1/videos/generate",
        Some(&token),
        json!({
            "project_id": project_id,
            "prompt": "a fox",
            "title": "Fox clip",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let handle = body_json(response).await;
    let video_id = handle["video_id"].as_i64().unwrap();

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/projects/{project_id}/videos"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let videos = body_json(response).await;
    assert_eq!(videos.as_array().unwrap().len(), 1);
    assert_eq!(videos[0]["title"], "Fox clip");

    let response = get_auth(
        app,
        &format!("/api/v1/videos/{video_id}/versions"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let versions = body_json(response).await;
    assert_eq!(versions.as_array().unwrap().len(), 1);
    assert_eq!(versions[0]["prompt"], "a fox");
    assert_eq!(versions[0]["mode"], "text_to_video");
}
