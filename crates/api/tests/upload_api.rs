//! Upload registration and signed URL issuance.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{body_json, get_auth, post_json, token_for};

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_register_and_sign(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = token_for("user-1");

    let response = post_json(
        app.clone(),
        "/api/v1/uploads",
        Some(&token),
        json!({
            "storage_path": "user-1/raw/face.png",
            "original_name": "face.png",
            "mime_type": "image/png",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let upload = body_json(response).await;
    assert!(upload["gcs_uri"].is_null());
    let id = upload["id"].as_i64().unwrap();

    let response = get_auth(app.clone(), &format!("/api/v1/uploads/{id}/url"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let signed = body_json(response).await;
    assert_eq!(
        signed["url"],
        "https://signed.test/primary-bucket/user-1/raw/face.png"
    );
    assert_eq!(signed["expires_in_secs"], 3600);

    // Another user cannot sign it.
    let response = get_auth(
        app,
        &format!("/api/v1/uploads/{id}/url"),
        &token_for("user-2"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_requires_mime_type(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/uploads",
        Some(&token_for("user-1")),
        json!({
            "storage_path": "user-1/raw/face.png",
            "mime_type": "  ",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
