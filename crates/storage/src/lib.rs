//! Object storage access and cross-store mirroring.
//!
//! Uploads live in the app's primary bucket; the generation provider
//! can only read from its own cloud storage, so inputs are mirrored
//! across before submission. `MirrorService` memoizes the mirrored
//! location on the database row so each object transfers once.

use std::time::Duration;

use async_trait::async_trait;

pub mod mirror;
pub mod s3;

pub use mirror::{MirrorError, MirrorService, Mirrored};
pub use s3::{S3Store, S3StoreConfig};

/// Errors from object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The object does not exist at the given key.
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Any other transfer failure.
    #[error("storage transfer failed: {0}")]
    Transfer(String),
}

/// Downloaded object payload.
#[derive(Debug, Clone)]
pub struct ObjectBody {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Minimal bucket operations, mockable in tests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn download(&self, bucket: &str, key: &str) -> Result<ObjectBody, StorageError>;

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), StorageError>;

    /// Time-limited read URL for an object.
    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;
}
