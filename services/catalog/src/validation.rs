//! Product form validation

use common::validation::{FieldRule, FormInput, Schema, ValidationErrors};

use crate::models::product::ProductInput;

pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const STOCK: &str = "stock";
pub const COLOR: &str = "color";
pub const PRICE: &str = "price";

/// Schema of the product form
pub fn product_schema() -> Schema {
    Schema::new()
        .field(FieldRule::text(NAME).label("Name").required())
        .field(FieldRule::text(DESCRIPTION).label("Description").required())
        .field(
            FieldRule::integer(STOCK)
                .label("Stock")
                .required()
                .min(0.0)
                .max(i32::MAX as f64),
        )
        .field(FieldRule::text(COLOR).label("Color").required())
        .field(FieldRule::number(PRICE).label("Price").required().min(0.0))
}

impl ProductInput {
    /// Validate a product form
    pub fn from_form(input: &FormInput) -> Result<Self, ValidationErrors> {
        let record = product_schema().validate(input)?;
        Ok(Self {
            name: record.text(NAME).unwrap_or_default().to_string(),
            description: record.text(DESCRIPTION).unwrap_or_default().to_string(),
            stock: record
                .integer(STOCK)
                .and_then(|stock| i32::try_from(stock).ok())
                .unwrap_or_default(),
            color: record.text(COLOR).unwrap_or_default().to_string(),
            price: record.number(PRICE).unwrap_or_default(),
        })
    }
}
