//! S3-protocol object store.
//!
//! Works against AWS S3 and against Google Cloud Storage through its
//! interoperability endpoint, so the same implementation serves both
//! the primary bucket and the provider-side mirror bucket.

use std::time::Duration;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use crate::{ObjectBody, ObjectStore, StorageError};

/// Connection settings for one S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3StoreConfig {
    /// Endpoint URL, e.g. `https://storage.googleapis.com`.
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Path-style addressing; required by most non-AWS endpoints.
    pub force_path_style: bool,
}

/// Object store backed by the AWS S3 SDK.
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub async fn new(config: S3StoreConfig) -> Self {
        let credentials = Credentials::from_keys(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
        );
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint.clone())
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();
        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn download(&self, bucket: &str, key: &str) -> Result<ObjectBody, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify_get_error(err, bucket, key))?;

        let mime_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| StorageError::Transfer(err.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(ObjectBody { bytes, mime_type })
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(mime_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| StorageError::Transfer(err.to_string()))?;
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|err| StorageError::Transfer(err.to_string()))?;
        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| StorageError::Transfer(err.to_string()))?;
        Ok(presigned.uri().to_string())
    }
}

fn classify_get_error(
    err: SdkError<aws_sdk_s3::operation::get_object::GetObjectError>,
    bucket: &str,
    key: &str,
) -> StorageError {
    if let SdkError::ServiceError(service) = &err {
        if service.err().is_no_such_key() {
            return StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            };
        }
    }
    StorageError::Transfer(err.to_string())
}
