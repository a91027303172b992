//! Integration tests for Horno.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p horno-integration-tests
//! ```
//!
//! The tests drive the real HTTP gateways against [`MockBackend`], an
//! in-process axum server on an ephemeral port that speaks the storefront
//! API and records every request it receives.
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart store end to end over HTTP
//! - `catalog` - Product lookups, legacy payloads and image URLs
//! - `repository` - Stored cart reads and writes

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use horno_cart::{CartClientConfig, CartStore, HttpCartRepository, HttpCatalog};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// A request the mock backend received.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    GetProduct(i32),
    GetCart(i32),
    SaveCart { user_id: i32, items: Value },
    DeleteCart(i32),
}

#[derive(Default)]
struct Backend {
    products: HashMap<i32, Value>,
    failing_products: HashSet<i32>,
    carts: HashMap<i32, Value>,
    failing_carts: HashSet<i32>,
    requests: Vec<Recorded>,
}

type Shared = Arc<Mutex<Backend>>;

fn lock(backend: &Shared) -> MutexGuard<'_, Backend> {
    backend.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process storefront API.
pub struct MockBackend {
    base_url: Url,
    backend: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let backend = Shared::default();
        let app = Router::new()
            .route("/api/products/{id}", get(get_product))
            .route("/api/cart", get(get_cart).post(save_cart).delete(delete_cart))
            .with_state(Arc::clone(&backend));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind mock backend: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock backend has no address: {e}"));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api"))
            .unwrap_or_else(|e| panic!("invalid mock backend url: {e}"));
        Self {
            base_url,
            backend,
            server,
        }
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> CartClientConfig {
        CartClientConfig::new(self.base_url.clone())
    }

    /// A cart store wired to this backend through the HTTP gateways.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP clients fail to build.
    #[must_use]
    pub fn store(&self) -> CartStore<HttpCatalog, HttpCartRepository> {
        let config = self.config();
        CartStore::new(
            HttpCatalog::new(&config).unwrap_or_else(|e| panic!("{e}")),
            HttpCartRepository::new(&config).unwrap_or_else(|e| panic!("{e}")),
        )
    }

    /// Serve `payload` for `GET /products/{id}`.
    pub fn add_product(&self, id: i32, payload: Value) {
        lock(&self.backend).products.insert(id, payload);
    }

    /// Serve a product using the documented field names.
    pub fn add_simple_product(&self, id: i32, name: &str, price: u32) {
        self.add_product(id, json!({ "id": id, "name": name, "price": price }));
    }

    /// Answer `GET /products/{id}` with a 500.
    pub fn fail_product(&self, id: i32) {
        lock(&self.backend).failing_products.insert(id);
    }

    /// Answer `GET /cart` for a user with a 500.
    pub fn fail_cart_loads(&self, user_id: i32) {
        lock(&self.backend).failing_carts.insert(user_id);
    }

    /// Seed the stored cart for a user.
    pub fn store_cart(&self, user_id: i32, items: Value) {
        lock(&self.backend).carts.insert(user_id, items);
    }

    /// The stored cart items for a user, if any.
    #[must_use]
    pub fn stored_cart(&self, user_id: i32) -> Option<Value> {
        lock(&self.backend).carts.get(&user_id).cloned()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.backend).requests.clone()
    }

    /// Only the cart writes (saves and deletes), in arrival order.
    #[must_use]
    pub fn cart_writes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| matches!(r, Recorded::SaveCart { .. } | Recorded::DeleteCart(_)))
            .collect()
    }

    pub fn clear_requests(&self) {
        lock(&self.backend).requests.clear();
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody {
    user_id: i32,
    items: Value,
}

async fn get_product(
    State(backend): State<Shared>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, StatusCode> {
    let mut backend = lock(&backend);
    backend.requests.push(Recorded::GetProduct(id));

    if backend.failing_products.contains(&id) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    backend
        .products
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_cart(
    State(backend): State<Shared>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, StatusCode> {
    let mut backend = lock(&backend);
    backend.requests.push(Recorded::GetCart(query.user_id));

    if backend.failing_carts.contains(&query.user_id) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let items = backend
        .carts
        .get(&query.user_id)
        .cloned()
        .unwrap_or_else(|| json!([]));
    Ok(Json(json!({ "items": items })))
}

async fn save_cart(State(backend): State<Shared>, Json(body): Json<SaveBody>) -> StatusCode {
    let mut backend = lock(&backend);
    backend.requests.push(Recorded::SaveCart {
        user_id: body.user_id,
        items: body.items.clone(),
    });
    backend.carts.insert(body.user_id, body.items);
    StatusCode::NO_CONTENT
}

async fn delete_cart(State(backend): State<Shared>, Query(query): Query<UserQuery>) -> StatusCode {
    let mut backend = lock(&backend);
    backend.requests.push(Recorded::DeleteCart(query.user_id));
    backend.carts.remove(&query.user_id);
    StatusCode::NO_CONTENT
}
