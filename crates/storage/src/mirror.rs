//! Mirroring of user media into provider-readable storage.

use std::sync::Arc;
use std::time::Duration;

use rand::distr::{Alphanumeric, SampleString};
use sqlx::PgPool;

use vidnova_core::types::DbId;
use vidnova_db::repositories::{AssetRepo, UploadRepo};

use crate::{ObjectStore, StorageError};

/// Length of the random object basename.
const OBJECT_NAME_LEN: usize = 21;

/// A provider-readable copy of some user media.
#[derive(Debug, Clone)]
pub struct Mirrored {
    /// `gs://` URI of the mirrored object.
    pub gcs_uri: String,
    pub mime_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("{entity} {id} belongs to another user")]
    Forbidden { entity: &'static str, id: DbId },

    #[error(transparent)]
    Transfer(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("output URI is not a gs:// URI: {0}")]
    MalformedUri(String),
}

/// Copies objects from the primary bucket into the mirror bucket and
/// memoizes the result on the source row. Re-requests of an already
/// mirrored object return the stored URI without touching storage.
pub struct MirrorService {
    primary: Arc<dyn ObjectStore>,
    mirror: Arc<dyn ObjectStore>,
    primary_bucket: String,
    mirror_bucket: String,
}

impl MirrorService {
    pub fn new(
        primary: Arc<dyn ObjectStore>,
        mirror: Arc<dyn ObjectStore>,
        primary_bucket: String,
        mirror_bucket: String,
    ) -> Self {
        Self {
            primary,
            mirror,
            primary_bucket,
            mirror_bucket,
        }
    }

    /// Mirror a user upload, enforcing ownership.
    pub async fn ensure_upload_mirrored(
        &self,
        pool: &PgPool,
        upload_id: DbId,
        user_id: &str,
        project_id: DbId,
    ) -> Result<Mirrored, MirrorError> {
        let upload = UploadRepo::find_by_id(pool, upload_id)
            .await?
            .ok_or(MirrorError::NotFound {
                entity: "upload",
                id: upload_id,
            })?;
        if upload.user_id != user_id {
            return Err(MirrorError::Forbidden {
                entity: "upload",
                id: upload_id,
            });
        }

        if let Some(gcs_uri) = upload.gcs_uri {
            return Ok(Mirrored {
                gcs_uri,
                mime_type: upload.mime_type,
            });
        }

        let key = self.input_key(user_id, project_id, "uploads", &upload.mime_type);
        let gcs_uri = self
            .transfer(&upload.storage_path, &key, &upload.mime_type)
            .await?;
        UploadRepo::set_gcs_uri(pool, upload_id, &gcs_uri).await?;

        Ok(Mirrored {
            gcs_uri,
            mime_type: upload.mime_type,
        })
    }

    /// Mirror an asset. Ownership was already established when the
    /// asset was resolved from an element the user owns.
    pub async fn ensure_asset_mirrored(
        &self,
        pool: &PgPool,
        asset_id: DbId,
        user_id: &str,
        project_id: DbId,
    ) -> Result<Mirrored, MirrorError> {
        let asset = AssetRepo::find_by_id(pool, asset_id)
            .await?
            .ok_or(MirrorError::NotFound {
                entity: "asset",
                id: asset_id,
            })?;
        if asset.user_id != user_id {
            return Err(MirrorError::Forbidden {
                entity: "asset",
                id: asset_id,
            });
        }

        if let Some(gcs_uri) = asset.gcs_uri {
            return Ok(Mirrored {
                gcs_uri,
                mime_type: asset.mime_type,
            });
        }

        let key = self.input_key(user_id, project_id, "assets", &asset.mime_type);
        let gcs_uri = self
            .transfer(&asset.storage_path, &key, &asset.mime_type)
            .await?;
        AssetRepo::set_gcs_uri(pool, asset_id, &gcs_uri).await?;

        Ok(Mirrored {
            gcs_uri,
            mime_type: asset.mime_type,
        })
    }

    /// Signed read URL for an object in the primary bucket.
    pub async fn sign_primary_url(
        &self,
        storage_path: &str,
        expires_in: Duration,
    ) -> Result<String, MirrorError> {
        Ok(self
            .primary
            .create_signed_url(&self.primary_bucket, storage_path, expires_in)
            .await?)
    }

    /// Signed read URL for a provider output `gs://` URI.
    pub async fn sign_output_url(
        &self,
        gcs_uri: &str,
        expires_in: Duration,
    ) -> Result<String, MirrorError> {
        let (bucket, key) = split_gs_uri(gcs_uri)
            .ok_or_else(|| MirrorError::MalformedUri(gcs_uri.to_string()))?;
        Ok(self.mirror.create_signed_url(bucket, key, expires_in).await?)
    }

    async fn transfer(
        &self,
        source_key: &str,
        dest_key: &str,
        mime_type: &str,
    ) -> Result<String, MirrorError> {
        tracing::debug!(source_key, dest_key, "mirroring object");
        let body = self.primary.download(&self.primary_bucket, source_key).await?;
        self.mirror
            .upload(&self.mirror_bucket, dest_key, body.bytes, mime_type)
            .await?;
        Ok(format!("gs://{}/{}", self.mirror_bucket, dest_key))
    }

    fn input_key(
        &self,
        user_id: &str,
        project_id: DbId,
        source_tag: &str,
        mime_type: &str,
    ) -> String {
        let name = Alphanumeric.sample_string(&mut rand::rng(), OBJECT_NAME_LEN);
        let ext = ext_for_mime(mime_type);
        format!("inputs/{user_id}/{project_id}/{source_tag}/{name}.{ext}")
    }
}

/// Split `gs://bucket/key` into bucket and key.
pub fn split_gs_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("gs://")?;
    let (bucket, key) = rest.split_once('/')?;
    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket, key))
}

/// File extension for a media MIME type; unknown types get `bin`.
pub fn ext_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gs_uri_splits() {
        assert_eq!(
            split_gs_uri("gs://bucket/a/b/c.mp4"),
            Some(("bucket", "a/b/c.mp4"))
        );
        assert_eq!(split_gs_uri("gs://bucket"), None);
        assert_eq!(split_gs_uri("s3://bucket/key"), None);
    }

    #[test]
    fn mime_extensions() {
        assert_eq!(ext_for_mime("image/png"), "png");
        assert_eq!(ext_for_mime("video/mp4"), "mp4");
        assert_eq!(ext_for_mime("application/octet-stream"), "bin");
    }
}
