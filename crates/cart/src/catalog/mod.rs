//! Product lookup gateway.
//!
//! # Architecture
//!
//! - [`ProductCatalog`] is the seam the cart store depends on: resolve one
//!   product id to its display attributes
//! - [`HttpCatalog`] implements it against `GET /products/{id}`
//! - Successful lookups are cached in memory via `moka` (5 minute TTL by
//!   default); failures are never cached
//!
//! Lookups are pure reads and may run concurrently. Callers decide how to
//! degrade when one fails; the gateway only reports what went wrong.

mod images;
mod wire;

use std::future::Future;
use std::sync::Arc;

use horno_core::{ProductDetails, ProductId};
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CartClientConfig;

pub use images::normalize_image_url;

/// Errors that can occur when resolving a product.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product id has no catalog entry.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("Catalog error: {status} - {message}")]
    Server { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Resolves product ids to display attributes.
pub trait ProductCatalog: Send + Sync + 'static {
    /// Look up a single product.
    fn resolve(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ProductDetails, CatalogError>> + Send;
}

impl<T: ProductCatalog> ProductCatalog for Arc<T> {
    fn resolve(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<ProductDetails, CatalogError>> + Send {
        (**self).resolve(id)
    }
}

// =============================================================================
// HttpCatalog
// =============================================================================

/// HTTP client for the product catalog.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    client: reqwest::Client,
    config: CartClientConfig,
    cache: Cache<ProductId, ProductDetails>,
}

impl HttpCatalog {
    /// Create a catalog client with its own HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CartClientConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a catalog client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &CartClientConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.catalog_cache.max_capacity)
            .time_to_live(config.catalog_cache.time_to_live)
            .build();

        Self {
            inner: Arc::new(HttpCatalogInner {
                client,
                config: config.clone(),
                cache,
            }),
        }
    }

    /// Drop every cached product.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }

    async fn fetch(&self, id: ProductId) -> Result<ProductDetails, CatalogError> {
        let url = self.inner.config.api_url(&format!("products/{id}"));

        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Server {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let payload: wire::ProductPayload = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e.to_string())
        })?;

        Ok(payload.into_details(id, self.inner.config.asset_base_url.as_str()))
    }
}

impl ProductCatalog for HttpCatalog {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn resolve(&self, id: ProductId) -> Result<ProductDetails, CatalogError> {
        // Check cache
        if let Some(product) = self.inner.cache.get(&id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product = self.fetch(id).await?;

        // Cache the result
        self.inner.cache.insert(id, product.clone()).await;

        Ok(product)
    }
}
