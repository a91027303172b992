//! Wire format of `GET /products/{id}`.
//!
//! Field names follow the documented contract; the aliases accept the
//! Spanish names still emitted by the legacy backend.

use horno_core::{Price, ProductDetails, ProductId};
use serde::Deserialize;

use super::images::normalize_image_url;

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    #[serde(alias = "id_producto")]
    pub id: ProductId,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "precio")]
    pub price: Price,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
    #[serde(default, rename = "imageUrl", alias = "imagen_url", alias = "image_url")]
    pub image_url: Option<String>,
}

impl ProductPayload {
    /// Convert into catalog details keyed by the id that was requested.
    pub fn into_details(self, requested: ProductId, asset_base: &str) -> ProductDetails {
        if self.id != requested {
            tracing::warn!(
                requested = %requested,
                returned = %self.id,
                "Catalog returned a different product id; keeping the requested one"
            );
        }

        ProductDetails {
            id: requested,
            name: self.name,
            price: self.price,
            description: self.description.filter(|d| !d.trim().is_empty()),
            image_url: normalize_image_url(self.image_url.as_deref(), asset_base),
        }
    }
}
