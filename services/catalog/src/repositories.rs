//! Product persistence

pub mod memory;
pub mod product;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::product::{NewProduct, Product, ProductChanges, ProductId};

/// Repository errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No row with this id belongs to the requesting owner
    #[error("Product {0} not found")]
    NotFound(ProductId),

    #[error("Data store unavailable: {0}")]
    Unavailable(String),
}

/// Access to the `productos` table
///
/// Every read and write is scoped by owner; rows of other owners are never
/// returned, changed or removed.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products of `owner_id`, ordered by id
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, RepositoryError>;

    async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    async fn update(
        &self,
        owner_id: Uuid,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError>;

    async fn delete(&self, owner_id: Uuid, id: ProductId) -> Result<(), RepositoryError>;
}
