//! Menu catalog: categories and products

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A menu category (entrées, mains, drinks...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A dish or drink offered on the menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub available: bool,
    pub image_url: Option<String>,
}

/// Payload for adding a product to the menu
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    pub category_id: Option<i64>,
    #[validate(length(min = 2, max = 150, message = "name must have 2 to 150 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description must not exceed 500 characters"))]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default = "default_available")]
    pub available: bool,
    pub image_url: Option<String>,
}

fn default_available() -> bool {
    true
}

/// Partial update of a product; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    pub category_id: Option<i64>,
    #[validate(length(min = 2, max = 150, message = "name must have 2 to 150 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "description must not exceed 500 characters"))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub available: Option<bool>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    /// Apply the present fields onto an existing product
    pub fn apply(&self, product: &mut Product) {
        if let Some(category_id) = self.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(available) = self.available {
            product.available = available;
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = Some(image_url.clone());
        }
    }
}

/// Listing filter for products
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub available: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.category_id
            .is_none_or(|c| product.category_id == Some(c))
            && self.available.is_none_or(|a| product.available == a)
    }
}
