//! Cart line items and the catalog data they are built from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Display attributes of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// One product and its quantity within a cart.
///
/// `quantity` is never zero inside a [`Cart`](crate::Cart): a row whose
/// quantity drops to zero is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl LineItem {
    /// Build a line item from resolved catalog details.
    #[must_use]
    pub fn from_details(details: ProductDetails, quantity: u32) -> Self {
        Self {
            product_id: details.id,
            name: details.name,
            unit_price: details.price,
            quantity,
            image_url: details.image_url,
            description: details.description,
        }
    }

    /// Build the placeholder row for a product whose lookup failed.
    ///
    /// Id and quantity survive so the shopper can still adjust or remove it.
    #[must_use]
    pub fn degraded(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            name: Self::placeholder_name(product_id),
            unit_price: Price::ZERO,
            quantity,
            image_url: None,
            description: None,
        }
    }

    /// Placeholder name shown for an unresolved product.
    #[must_use]
    pub fn placeholder_name(product_id: ProductId) -> String {
        format!("Producto {product_id}")
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}
