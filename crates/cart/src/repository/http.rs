//! HTTP implementation of [`CartRepository`].
//!
//! - `GET {api}/cart?userId={id}` -> `{"items": [{"productId", "quantity"}]}`
//! - `POST {api}/cart` with `{"userId", "items": [...]}`
//! - `DELETE {api}/cart?userId={id}`

use std::sync::Arc;

use horno_core::{Identity, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{CartRepository, RepositoryError, StoredLine};
use crate::config::CartClientConfig;

#[derive(Debug, Deserialize)]
struct CartPayload {
    #[serde(default)]
    items: Vec<StoredLine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveCartBody<'a> {
    user_id: UserId,
    items: &'a [StoredLine],
}

/// HTTP client for the remote cart store.
///
/// Every save is sent, so the last write always wins on the backend.
#[derive(Clone)]
pub struct HttpCartRepository {
    inner: Arc<HttpCartRepositoryInner>,
}

struct HttpCartRepositoryInner {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCartRepository {
    /// Create a repository client with its own HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CartClientConfig) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a repository client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &CartClientConfig) -> Self {
        Self {
            inner: Arc::new(HttpCartRepositoryInner {
                client,
                endpoint: config.api_url("cart"),
            }),
        }
    }

    fn user_url(&self, user_id: UserId) -> Result<Url, RepositoryError> {
        let mut url = Url::parse(&self.inner.endpoint)
            .map_err(|e| RepositoryError::Parse(format!("invalid cart endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("userId", &user_id.to_string());
        Ok(url)
    }

    /// Turn a non-success response into [`RepositoryError::Server`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RepositoryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RepositoryError::Server {
            status: status.as_u16(),
            message: message.chars().take(200).collect(),
        })
    }
}

impl CartRepository for HttpCartRepository {
    #[instrument(skip(self, identity), fields(user_id = %identity.id))]
    async fn load(&self, identity: &Identity) -> Result<Vec<StoredLine>, RepositoryError> {
        let url = self.user_url(identity.id)?;
        let response = Self::check(self.inner.client.get(url).send().await?).await?;
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let payload: CartPayload = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse stored cart"
            );
            RepositoryError::Parse(e.to_string())
        })?;

        debug!(lines = payload.items.len(), "Loaded stored cart");
        Ok(payload.items)
    }

    #[instrument(skip(self, identity, lines), fields(user_id = %identity.id, lines = lines.len()))]
    async fn save(&self, identity: &Identity, lines: &[StoredLine]) -> Result<(), RepositoryError> {
        let body = SaveCartBody {
            user_id: identity.id,
            items: lines,
        };
        let request = self.inner.client.post(&self.inner.endpoint).json(&body);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.id))]
    async fn delete(&self, identity: &Identity) -> Result<(), RepositoryError> {
        let url = self.user_url(identity.id)?;
        Self::check(self.inner.client.delete(url).send().await?).await?;
        Ok(())
    }
}
