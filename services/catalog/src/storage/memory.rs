//! In-memory image storage

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use common::config::CollisionPolicy;
use tokio::sync::Mutex;

use super::{ImageFile, ImageStorage, StorageError, public_object_url};

/// In-memory implementation of [`ImageStorage`]
pub struct InMemoryImageStorage {
    public_base_url: String,
    bucket: String,
    objects: Mutex<HashMap<String, ImageFile>>,
    upload_calls: AtomicUsize,
    fail_uploads: AtomicBool,
}

impl InMemoryImageStorage {
    pub fn new(public_base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
            upload_calls: AtomicUsize::new(0),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects.lock().await.contains_key(path)
    }

    pub async fn object(&self, path: &str) -> Option<ImageFile> {
        self.objects.lock().await.get(path).cloned()
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStorage for InMemoryImageStorage {
    async fn upload(
        &self,
        path: &str,
        file: &ImageFile,
        policy: CollisionPolicy,
    ) -> Result<(), StorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("bucket unreachable".to_string()));
        }

        let mut objects = self.objects.lock().await;
        if policy == CollisionPolicy::Reject && objects.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        objects.insert(path.to_string(), file.clone());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        self.objects.lock().await.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.public_base_url, &self.bucket, path)
    }
}
