//! Product image storage
//!
//! [`ImageUploader`] turns an attached [`ImageFile`] into a public URL by
//! writing it to `<folder>/<file_name>` through an [`ImageStorage`] backend.

pub mod memory;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use common::config::{CollisionPolicy, StorageSettings};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;
use tracing::{info, warn};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("An image already exists at {0}")]
    AlreadyExists(String),

    #[error("Invalid image file name: {0:?}")]
    InvalidName(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

/// An image picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Object storage backend
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Write `file` at `path`, honouring the collision policy
    async fn upload(
        &self,
        path: &str,
        file: &ImageFile,
        policy: CollisionPolicy,
    ) -> Result<(), StorageError>;

    /// Delete the object at `path`; a missing object is not an error
    async fn remove(&self, path: &str) -> Result<(), StorageError>;

    /// Publicly readable URL of the object at `path`
    fn public_url(&self, path: &str) -> String;
}

/// Bytes kept verbatim inside a URL path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `<base>/<bucket>/<path>`, with bucket and path segments percent-encoded
pub fn public_object_url(base: &str, bucket: &str, path: &str) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in std::iter::once(bucket).chain(path.split('/')) {
        url.push('/');
        url.extend(utf8_percent_encode(segment, SEGMENT));
    }
    url
}

/// An image written by [`ImageUploader::upload`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Object key inside the bucket
    pub path: String,
    pub public_url: String,
}

/// Uploads product images into the configured folder
#[derive(Clone)]
pub struct ImageUploader {
    storage: Arc<dyn ImageStorage>,
    folder: String,
    policy: CollisionPolicy,
}

impl ImageUploader {
    pub fn new(
        storage: Arc<dyn ImageStorage>,
        folder: impl Into<String>,
        policy: CollisionPolicy,
    ) -> Self {
        Self {
            storage,
            folder: folder.into(),
            policy,
        }
    }

    pub fn from_settings(storage: Arc<dyn ImageStorage>, settings: &StorageSettings) -> Self {
        Self::new(storage, settings.folder.clone(), settings.collision_policy)
    }

    /// Upload `file` and return where it was stored
    pub async fn upload(&self, file: &ImageFile) -> Result<UploadedImage, StorageError> {
        let path = self.object_path(&file.file_name)?;
        info!("Uploading image to {} ({} bytes)", path, file.bytes.len());

        self.storage
            .upload(&path, file, self.policy)
            .await
            .inspect_err(|e| warn!("Image upload to {} failed: {}", path, e))?;

        Ok(UploadedImage {
            public_url: self.storage.public_url(&path),
            path,
        })
    }

    /// Delete a previously uploaded image
    pub async fn remove(&self, image: &UploadedImage) -> Result<(), StorageError> {
        info!("Removing image {}", image.path);
        self.storage.remove(&image.path).await
    }

    fn object_path(&self, file_name: &str) -> Result<String, StorageError> {
        let valid = !file_name.trim().is_empty()
            && !file_name.contains(['/', '\\'])
            && file_name != "."
            && !file_name.contains("..");
        if !valid {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }

        let folder = self.folder.trim_matches('/');
        if folder.is_empty() {
            Ok(file_name.to_string())
        } else {
            Ok(format!("{}/{}", folder, file_name))
        }
    }
}
