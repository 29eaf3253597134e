//! Product store
//!
//! Cache of one identity's products. Every mutation runs validate, upload,
//! write and resync in that order; the cache is only ever replaced by a
//! full re-read of the owner's rows. Once the write has committed the
//! mutation succeeds: a failed resync is kept as [`ProductStore::sync_error`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use auth::Identity;
use common::error::{Action, AppError, AppResult};
use common::validation::FormInput;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::models::product::{Product, ProductId, ProductInput};
use crate::repositories::ProductRepository;
use crate::storage::{ImageFile, ImageUploader, UploadedImage};

/// Raised flag, lowered on drop
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }

    fn try_raise(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Products of a single owner
pub struct ProductStore {
    owner: Identity,
    repository: Arc<dyn ProductRepository>,
    uploader: ImageUploader,
    products: RwLock<Vec<Product>>,
    sync_error: RwLock<Option<String>>,
    loading: AtomicBool,
    mutating: AtomicBool,
}

impl ProductStore {
    /// Create an empty store for `owner`
    pub fn new(
        owner: Identity,
        repository: Arc<dyn ProductRepository>,
        uploader: ImageUploader,
    ) -> Self {
        Self {
            owner,
            repository,
            uploader,
            products: RwLock::new(Vec::new()),
            sync_error: RwLock::new(None),
            loading: AtomicBool::new(false),
            mutating: AtomicBool::new(false),
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Snapshot of the cached products
    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn find(&self, id: ProductId) -> Option<Product> {
        self.products
            .read()
            .await
            .iter()
            .find(|product| product.id == id)
            .cloned()
    }

    /// Message of the last failed load, cleared by the next successful one
    pub async fn sync_error(&self) -> Option<String> {
        self.sync_error.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Whether a create, update or delete is in flight
    pub fn is_mutating(&self) -> bool {
        self.mutating.load(Ordering::SeqCst)
    }

    /// Replace the cache with the owner's rows
    ///
    /// On failure the cache is emptied.
    pub async fn fetch_all(&self) -> AppResult<usize> {
        let _loading = FlagGuard::raise(&self.loading);

        match self.repository.list_by_owner(self.owner.id).await {
            Ok(mut products) => {
                let total = products.len();
                products.retain(|product| product.owner_id == self.owner.id);
                if products.len() != total {
                    warn!(
                        "Dropped {} rows not owned by {}",
                        total - products.len(),
                        self.owner.id
                    );
                }

                let count = products.len();
                *self.products.write().await = products;
                *self.sync_error.write().await = None;
                info!("Loaded {} products for {}", count, self.owner.id);
                Ok(count)
            }
            Err(e) => {
                error!("Failed to load products for {}: {}", self.owner.id, e);
                self.products.write().await.clear();
                let err = AppError::persistence(Action::LoadProducts, e);
                *self.sync_error.write().await = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Validate, upload the image if any, insert, then resync
    pub async fn create(&self, form: &FormInput, image: Option<&ImageFile>) -> AppResult<Product> {
        let _pending = self.begin_mutation()?;
        let input = ProductInput::from_form(form)?;
        let uploaded = self.upload(image).await?;
        let image_url = uploaded.as_ref().map(|image| image.public_url.clone());

        let product = match self
            .repository
            .insert(&input.into_new(self.owner.id, image_url))
            .await
        {
            Ok(product) => product,
            Err(e) => {
                error!("Failed to insert product: {}", e);
                self.discard(uploaded).await;
                return Err(AppError::persistence(Action::AddProduct, e));
            }
        };
        info!("Created product {} for {}", product.id, self.owner.id);

        self.resync().await;
        Ok(product)
    }

    /// Validate, upload the image if any, update the owner's row, then resync
    ///
    /// Without a new image the stored image URL is kept.
    pub async fn update(
        &self,
        id: ProductId,
        form: &FormInput,
        image: Option<&ImageFile>,
    ) -> AppResult<Product> {
        let _pending = self.begin_mutation()?;
        let input = ProductInput::from_form(form)?;
        let uploaded = self.upload(image).await?;
        let image_url = uploaded.as_ref().map(|image| image.public_url.clone());

        let product = match self
            .repository
            .update(self.owner.id, id, &input.into_changes(image_url))
            .await
        {
            Ok(product) => product,
            Err(e) => {
                error!("Failed to update product {}: {}", id, e);
                self.discard(uploaded).await;
                return Err(AppError::persistence(Action::UpdateProduct, e));
            }
        };
        info!("Updated product {}", id);

        self.resync().await;
        Ok(product)
    }

    /// Delete the owner's row, then resync
    pub async fn delete(&self, id: ProductId) -> AppResult<()> {
        let _pending = self.begin_mutation()?;

        self.repository
            .delete(self.owner.id, id)
            .await
            .map_err(|e| {
                error!("Failed to delete product {}: {}", id, e);
                AppError::persistence(Action::DeleteProduct, e)
            })?;
        info!("Deleted product {}", id);

        self.resync().await;
        Ok(())
    }

    fn begin_mutation(&self) -> AppResult<FlagGuard<'_>> {
        FlagGuard::try_raise(&self.mutating).ok_or_else(|| {
            warn!("Rejected a mutation while another is pending");
            AppError::Busy
        })
    }

    async fn upload(&self, image: Option<&ImageFile>) -> AppResult<Option<UploadedImage>> {
        match image {
            Some(file) => self
                .uploader
                .upload(file)
                .await
                .map(Some)
                .map_err(|e| AppError::upload(Action::UploadImage, e)),
            None => Ok(None),
        }
    }

    /// Remove an image whose record write failed
    async fn discard(&self, uploaded: Option<UploadedImage>) {
        if let Some(image) = uploaded
            && let Err(e) = self.uploader.remove(&image).await
        {
            warn!("Failed to remove orphaned image {}: {}", image.path, e);
        }
    }

    /// Re-read after a committed write; failures land in `sync_error`
    async fn resync(&self) {
        if let Err(e) = self.fetch_all().await {
            warn!("Write committed but resync failed: {}", e);
        }
    }
}
