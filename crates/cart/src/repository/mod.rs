//! Remote per-user cart persistence.
//!
//! The remote store is a best-effort mirror of the in-memory cart,
//! partitioned by [`Identity`]. It is only ever addressed for a persistable
//! identity; guest carts never leave memory.

mod http;

use std::future::Future;
use std::sync::Arc;

use horno_core::{Identity, LineItem, Price, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpCartRepository;

/// Errors that can occur when reading or writing a stored cart.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Cart store error: {status} - {message}")]
    Server { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One persisted cart row.
///
/// Loading only needs `product_id` and `quantity`; the display fields are
/// written alongside for the benefit of other readers of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLine {
    #[serde(alias = "producto_id")]
    pub product_id: ProductId,
    #[serde(alias = "cantidad")]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl StoredLine {
    /// A bare `(product_id, quantity)` row.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            name: None,
            price: None,
        }
    }
}

impl From<&LineItem> for StoredLine {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: i64::from(item.quantity),
            name: Some(item.name.clone()),
            price: Some(item.unit_price),
        }
    }
}

/// Reads and writes the cart stored for an identity.
pub trait CartRepository: Send + Sync + 'static {
    /// Fetch the stored rows, in stored order. Empty if nothing is stored.
    fn load(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<StoredLine>, RepositoryError>> + Send;

    /// Replace the stored rows.
    fn save(
        &self,
        identity: &Identity,
        lines: &[StoredLine],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove the stored record entirely.
    fn delete(&self, identity: &Identity)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Drop any client-side state kept for `identity` (called on logout).
    fn forget(&self, identity: &Identity) -> impl Future<Output = ()> + Send {
        let _ = identity;
        async {}
    }
}

impl<T: CartRepository> CartRepository for Arc<T> {
    fn load(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<Vec<StoredLine>, RepositoryError>> + Send {
        (**self).load(identity)
    }

    fn save(
        &self,
        identity: &Identity,
        lines: &[StoredLine],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        (**self).save(identity, lines)
    }

    fn delete(
        &self,
        identity: &Identity,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        (**self).delete(identity)
    }

    fn forget(&self, identity: &Identity) -> impl Future<Output = ()> + Send {
        (**self).forget(identity)
    }
}
