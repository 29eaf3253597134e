//! Product model
//!
//! Rows live in the `productos` table; field names on the wire follow the
//! table's column names.

use common::validation::FormInput;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{COLOR, DESCRIPTION, NAME, PRICE, STOCK};

/// Provider-assigned product identifier
pub type ProductId = i64;

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "usuario_id")]
    pub owner_id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub stock: i32,
    pub color: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "imagen_url")]
    pub image_url: Option<String>,
}

impl Product {
    /// Form values for editing this product
    pub fn to_form(&self) -> FormInput {
        FormInput::new()
            .with(NAME, self.name.clone())
            .with(DESCRIPTION, self.description.clone())
            .with(STOCK, self.stock.to_string())
            .with(COLOR, self.color.clone())
            .with(PRICE, self.price.to_string())
    }
}

/// Validated product fields, as submitted through the product form
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub stock: i32,
    pub color: String,
    pub price: f64,
}

impl ProductInput {
    pub fn into_new(self, owner_id: Uuid, image_url: Option<String>) -> NewProduct {
        NewProduct {
            owner_id,
            name: self.name,
            description: self.description,
            stock: self.stock,
            color: self.color,
            price: self.price,
            image_url,
        }
    }

    pub fn into_changes(self, image_url: Option<String>) -> ProductChanges {
        ProductChanges {
            name: self.name,
            description: self.description,
            stock: self.stock,
            color: self.color,
            price: self.price,
            image_url,
        }
    }
}

/// New product creation payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    #[serde(rename = "usuario_id")]
    pub owner_id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub stock: i32,
    pub color: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "imagen_url")]
    pub image_url: Option<String>,
}

/// Product update payload
///
/// `id` and owner are never part of an update. `image_url: None` keeps the
/// stored URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductChanges {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub stock: i32,
    pub color: String,
    #[serde(rename = "precio")]
    pub price: f64,
    #[serde(rename = "imagen_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Product {
        Product {
            id: 7,
            owner_id: Uuid::nil(),
            name: "Mug".to_string(),
            description: "Ceramic".to_string(),
            stock: 3,
            color: "Blue".to_string(),
            price: 12.5,
            image_url: None,
        }
    }

    #[test]
    fn test_product_uses_column_names() {
        let value = serde_json::to_value(product()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "usuario_id": "00000000-0000-0000-0000-000000000000",
                "nombre": "Mug",
                "descripcion": "Ceramic",
                "stock": 3,
                "color": "Blue",
                "precio": 12.5,
                "imagen_url": null
            })
        );
    }

    #[test]
    fn test_changes_without_image_leave_column_out() {
        let changes = ProductInput {
            name: "Mug".to_string(),
            description: "Ceramic".to_string(),
            stock: 3,
            color: "Blue".to_string(),
            price: 12.5,
        }
        .into_changes(None);

        let value = serde_json::to_value(changes).unwrap();
        assert!(value.get("imagen_url").is_none());
        assert!(value.get("usuario_id").is_none());
    }

    #[test]
    fn test_to_form_round_trips_through_fields() {
        let form = product().to_form();
        assert_eq!(form.get(NAME), Some("Mug"));
        assert_eq!(form.get(STOCK), Some("3"));
        assert_eq!(form.get(PRICE), Some("12.5"));
    }
}
