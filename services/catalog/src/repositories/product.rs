//! PostgreSQL product repository

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{ProductRepository, RepositoryError};
use crate::models::product::{NewProduct, Product, ProductChanges, ProductId};

/// Product repository backed by the `productos` table
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: row.get("id"),
        owner_id: row.get("usuario_id"),
        name: row.get("nombre"),
        description: row.get("descripcion"),
        stock: row.get("stock"),
        color: row.get("color"),
        price: row.get("precio"),
        image_url: row.get("imagen_url"),
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, usuario_id, nombre, descripcion, stock, color, precio, imagen_url
            FROM productos
            WHERE usuario_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            r#"
            INSERT INTO productos (usuario_id, nombre, descripcion, stock, color, precio, imagen_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, usuario_id, nombre, descripcion, stock, color, precio, imagen_url
            "#,
        )
        .bind(product.owner_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.stock)
        .bind(&product.color)
        .bind(product.price)
        .bind(&product.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(product_from_row(&row))
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE productos
            SET nombre = $3, descripcion = $4, stock = $5, color = $6, precio = $7,
                imagen_url = COALESCE($8, imagen_url)
            WHERE id = $1 AND usuario_id = $2
            RETURNING id, usuario_id, nombre, descripcion, stock, color, precio, imagen_url
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.stock)
        .bind(&changes.color)
        .bind(changes.price)
        .bind(&changes.image_url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| product_from_row(&row))
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn delete(&self, owner_id: Uuid, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM productos WHERE id = $1 AND usuario_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
