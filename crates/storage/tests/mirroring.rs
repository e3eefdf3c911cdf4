//! Integration tests for mirror memoization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use vidnova_db::models::asset::CreateAsset;
use vidnova_db::models::upload::CreateUserUpload;
use vidnova_db::repositories::{AssetRepo, UploadRepo};
use vidnova_storage::{MirrorError, MirrorService, ObjectBody, ObjectStore, StorageError};

const USER: &str = "user-1";
const PROJECT: i64 = 1;

/// Store that counts transfers and serves a fixed payload.
#[derive(Default)]
struct CountingStore {
    downloads: AtomicUsize,
    uploads: AtomicUsize,
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn download(&self, _bucket: &str, _key: &str) -> Result<ObjectBody, StorageError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(ObjectBody {
            bytes: vec![1, 2, 3],
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
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!("https://signed.example/{bucket}/{key}"))
    }
}

fn service() -> (MirrorService, Arc<CountingStore>, Arc<CountingStore>) {
    let primary = Arc::new(CountingStore::default());
    let mirror = Arc::new(CountingStore::default());
    let service = MirrorService::new(
        primary.clone(),
        mirror.clone(),
        "primary-bucket".to_string(),
        "mirror-bucket".to_string(),
    );
    (service, primary, mirror)
}

async fn make_upload(pool: &PgPool, user_id: &str) -> i64 {
    UploadRepo::create(
        pool,
        user_id,
        &CreateUserUpload {
            storage_path: "uploads/photo.png".to_string(),
            original_name: Some("photo.png".to_string()),
            mime_type: "image/png".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../db/migrations")]
async fn first_request_transfers_and_memoizes(pool: PgPool) {
    let (service, primary, mirror) = service();
    let upload_id = make_upload(&pool, USER).await;

    let mirrored = service
        .ensure_upload_mirrored(&pool, upload_id, USER, PROJECT)
        .await
        .unwrap();

    assert!(mirrored.gcs_uri.starts_with("gs://mirror-bucket/inputs/user-1/1/uploads/"));
    assert_eq!(mirrored.mime_type, "image/png");
    assert_eq!(primary.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.uploads.load(Ordering::SeqCst), 1);

    let stored = UploadRepo::find_by_id(&pool, upload_id).await.unwrap().unwrap();
    assert_eq!(stored.gcs_uri, Some(mirrored.gcs_uri));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn repeat_request_moves_no_bytes(pool: PgPool) {
    let (service, primary, mirror) = service();
    let upload_id = make_upload(&pool, USER).await;

    let first = service
        .ensure_upload_mirrored(&pool, upload_id, USER, PROJECT)
        .await
        .unwrap();
    let second = service
        .ensure_upload_mirrored(&pool, upload_id, USER, PROJECT)
        .await
        .unwrap();

    assert_eq!(first.gcs_uri, second.gcs_uri);
    assert_eq!(primary.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.uploads.load(Ordering::SeqCst), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn foreign_upload_is_forbidden(pool: PgPool) {
    let (service, primary, _mirror) = service();
    let upload_id = make_upload(&pool, "someone-else").await;

    let err = service
        .ensure_upload_mirrored(&pool, upload_id, USER, PROJECT)
        .await
        .unwrap_err();

    assert!(matches!(err, MirrorError::Forbidden { entity: "upload", .. }));
    assert_eq!(primary.downloads.load(Ordering::SeqCst), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_upload_is_not_found(pool: PgPool) {
    let (service, _primary, _mirror) = service();

    let err = service
        .ensure_upload_mirrored(&pool, 999, USER, PROJECT)
        .await
        .unwrap_err();

    assert!(matches!(err, MirrorError::NotFound { entity: "upload", .. }));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn asset_mirroring_memoizes_too(pool: PgPool) {
    let (service, primary, mirror) = service();
    let asset = AssetRepo::create(
        &pool,
        USER,
        &CreateAsset {
            storage_path: "assets/fox.png".to_string(),
            public_url: Some("https://cdn.example/fox.png".to_string()),
            mime_type: "image/png".to_string(),
            size_bytes: Some(3),
            width: None,
            height: None,
            kind: "image".to_string(),
        },
    )
    .await
    .unwrap();

    service
        .ensure_asset_mirrored(&pool, asset.id, USER, PROJECT)
        .await
        .unwrap();
    service
        .ensure_asset_mirrored(&pool, asset.id, USER, PROJECT)
        .await
        .unwrap();

    assert_eq!(primary.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.uploads.load(Ordering::SeqCst), 1);
}
