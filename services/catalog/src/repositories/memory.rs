//! In-memory product repository
//!
//! Mirrors the owner scoping of the PostgreSQL repository. Call counters and
//! failure switches let tests observe and break the data store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ProductRepository, RepositoryError};
use crate::models::product::{NewProduct, Product, ProductChanges, ProductId};

/// In-memory implementation of [`ProductRepository`]
pub struct InMemoryProductRepository {
    rows: Mutex<BTreeMap<ProductId, Product>>,
    next_id: AtomicI64,
    list_calls: AtomicUsize,
    write_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            list_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row directly, assigning the next id
    pub async fn seed(&self, product: NewProduct) -> Product {
        let product = self.materialize(product);
        self.rows.lock().await.insert(product.id, product.clone());
        product
    }

    /// Every stored row, whatever its owner
    pub async fn rows(&self) -> Vec<Product> {
        self.rows.lock().await.values().cloned().collect()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Inserts, updates and deletes attempted so far
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn materialize(&self, product: NewProduct) -> Product {
        Product {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            owner_id: product.owner_id,
            name: product.name,
            description: product.description,
            stock: product.stock,
            color: product.color,
            price: product.price,
            image_url: product.image_url,
        }
    }

    fn begin_write(&self) -> Result<(), RepositoryError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("read rejected".to_string()));
        }

        let rows = self.rows.lock().await;
        Ok(rows
            .values()
            .filter(|product| product.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.begin_write()?;
        let product = self.materialize(product.clone());
        self.rows.lock().await.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        self.begin_write()?;
        let mut rows = self.rows.lock().await;
        let product = rows
            .get_mut(&id)
            .filter(|product| product.owner_id == owner_id)
            .ok_or(RepositoryError::NotFound(id))?;

        product.name = changes.name.clone();
        product.description = changes.description.clone();
        product.stock = changes.stock;
        product.color = changes.color.clone();
        product.price = changes.price;
        if let Some(image_url) = &changes.image_url {
            product.image_url = Some(image_url.clone());
        }
        Ok(product.clone())
    }

    async fn delete(&self, owner_id: Uuid, id: ProductId) -> Result<(), RepositoryError> {
        self.begin_write()?;
        let mut rows = self.rows.lock().await;
        match rows.get(&id) {
            Some(product) if product.owner_id == owner_id => {
                rows.remove(&id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound(id)),
        }
    }
}
