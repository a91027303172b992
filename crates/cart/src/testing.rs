//! In-memory gateway fakes for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use horno_core::{Email, Identity, Price, ProductDetails, ProductId, UserId};
use tokio::sync::Notify;

use crate::catalog::{CatalogError, ProductCatalog};
use crate::repository::{CartRepository, RepositoryError, StoredLine};

pub fn identity(id: i32, email: &str) -> Identity {
    Identity::new(UserId::new(id), Email::parse(email).unwrap_or_else(|e| panic!("{e}")))
}

pub fn details(id: i32, name: &str, price: u32) -> ProductDetails {
    ProductDetails {
        id: ProductId::new(id),
        name: name.to_string(),
        price: Price::from_units(price),
        description: None,
        image_url: None,
    }
}

// =============================================================================
// FakeCatalog
// =============================================================================

#[derive(Default)]
pub struct FakeCatalog {
    products: HashMap<ProductId, ProductDetails>,
    failing: HashSet<ProductId>,
    panicking: HashSet<ProductId>,
    lookups: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, id: i32, name: &str, price: u32) -> Self {
        self.products.insert(ProductId::new(id), details(id, name, price));
        self
    }

    /// Lookups for `id` fail with a server error.
    pub fn failing(mut self, id: i32) -> Self {
        self.failing.insert(ProductId::new(id));
        self
    }

    /// Lookups for `id` panic inside the lookup task.
    pub fn panicking(mut self, id: i32) -> Self {
        self.panicking.insert(ProductId::new(id));
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ProductCatalog for FakeCatalog {
    async fn resolve(&self, id: ProductId) -> Result<ProductDetails, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        assert!(!self.panicking.contains(&id), "catalog exploded on {id}");
        if self.failing.contains(&id) {
            return Err(CatalogError::Server {
                status: 503,
                message: "catalog unavailable".to_string(),
            });
        }
        self.products
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }
}

// =============================================================================
// RecordingRepository
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    Load(UserId),
    Save(UserId, Vec<(ProductId, i64)>),
    Delete(UserId),
    Forget(UserId),
}

#[derive(Default)]
pub struct RecordingRepository {
    stored: Mutex<HashMap<UserId, Vec<StoredLine>>>,
    calls: Mutex<Vec<RepoCall>>,
    failing_loads: Mutex<HashSet<UserId>>,
    failing_saves: Mutex<bool>,
    gates: Mutex<HashMap<UserId, Arc<Notify>>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stored(self, user_id: i32, lines: &[(i32, i64)]) -> Self {
        self.put(user_id, lines);
        self
    }

    pub fn put(&self, user_id: i32, lines: &[(i32, i64)]) {
        let lines = lines
            .iter()
            .map(|&(id, q)| StoredLine::new(ProductId::new(id), q))
            .collect();
        lock(&self.stored).insert(UserId::new(user_id), lines);
    }

    pub fn fail_loads_for(&self, user_id: i32) {
        lock(&self.failing_loads).insert(UserId::new(user_id));
    }

    pub fn fail_saves(&self) {
        *lock(&self.failing_saves) = true;
    }

    /// Make loads for `user_id` wait until the returned gate is notified.
    pub fn hold_loads_for(&self, user_id: i32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.gates).insert(UserId::new(user_id), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<RepoCall> {
        lock(&self.calls).clone()
    }

    pub fn saves(&self) -> Vec<RepoCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, RepoCall::Save(..)))
            .collect()
    }

    pub fn stored(&self, user_id: i32) -> Option<Vec<(ProductId, i64)>> {
        lock(&self.stored)
            .get(&UserId::new(user_id))
            .map(|lines| summarize(lines))
    }

    fn record(&self, call: RepoCall) {
        lock(&self.calls).push(call);
    }
}

impl CartRepository for RecordingRepository {
    async fn load(&self, identity: &Identity) -> Result<Vec<StoredLine>, RepositoryError> {
        self.record(RepoCall::Load(identity.id));

        let gate = lock(&self.gates).get(&identity.id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if lock(&self.failing_loads).contains(&identity.id) {
            return Err(RepositoryError::Server {
                status: 500,
                message: "database down".to_string(),
            });
        }
        Ok(lock(&self.stored)
            .get(&identity.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, identity: &Identity, lines: &[StoredLine]) -> Result<(), RepositoryError> {
        self.record(RepoCall::Save(identity.id, summarize(lines)));
        if *lock(&self.failing_saves) {
            return Err(RepositoryError::Server {
                status: 500,
                message: "database down".to_string(),
            });
        }
        lock(&self.stored).insert(identity.id, lines.to_vec());
        Ok(())
    }

    async fn delete(&self, identity: &Identity) -> Result<(), RepositoryError> {
        self.record(RepoCall::Delete(identity.id));
        lock(&self.stored).remove(&identity.id);
        Ok(())
    }

    async fn forget(&self, identity: &Identity) {
        self.record(RepoCall::Forget(identity.id));
    }
}

fn summarize(lines: &[StoredLine]) -> Vec<(ProductId, i64)> {
    lines.iter().map(|l| (l.product_id, l.quantity)).collect()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
