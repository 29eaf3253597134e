//! S3-compatible image storage

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use common::config::{CollisionPolicy, StorageSettings};
use tracing::{debug, info};

use super::{ImageFile, ImageStorage, StorageError, public_object_url};

/// Image storage on an S3-compatible endpoint, addressed path-style
pub struct S3ImageStorage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ImageStorage {
    pub fn new(client: Client, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Build a client for the configured endpoint
    ///
    /// Credentials come from the standard AWS provider chain.
    pub async fn from_settings(settings: &StorageSettings) -> Self {
        info!(
            "Connecting to object storage at {} (bucket {})",
            settings.endpoint, settings.bucket
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(&settings.endpoint)
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Self::new(
            Client::from_conf(config),
            settings.bucket.clone(),
            settings.public_base_url.clone(),
        )
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(e) => Err(StorageError::Backend(DisplayErrorContext(&e).to_string())),
        }
    }
}

#[async_trait]
impl ImageStorage for S3ImageStorage {
    async fn upload(
        &self,
        path: &str,
        file: &ImageFile,
        policy: CollisionPolicy,
    ) -> Result<(), StorageError> {
        if policy == CollisionPolicy::Reject && self.exists(path).await? {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(file.bytes.clone()))
            .set_content_type(file.content_type.clone())
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;

        debug!("Stored s3://{}/{}", self.bucket, path);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;

        debug!("Deleted s3://{}/{}", self.bucket, path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.public_base_url, &self.bucket, path)
    }
}
