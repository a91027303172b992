//! The authoritative in-memory cart for the active session.
//!
//! # Architecture
//!
//! - All cart state lives in one [`CartStore`], behind a mutex that is never
//!   held across an `.await`; every public mutation runs to completion under it
//! - Observers read through a `watch` channel (latest [`CartSnapshot`]) or a
//!   `broadcast` channel ([`CartEvent`] per change)
//! - Persistence is a best-effort mirror: writes are queued to a background
//!   writer and their failures never touch the in-memory cart
//!
//! # Session transitions
//!
//! [`CartStore::rebind`] is the lifecycle hook for "the logged-in identity
//! changed". The old cart is discarded and an empty snapshot is published
//! before any request for the new identity is issued. Each transition bumps
//! a session epoch; a load only installs its result if the epoch it started
//! under is still current, so a slow load for a previous identity is dropped.
//!
//! Mutations made while a load is in flight are applied to the visible cart
//! and replayed on top of the loaded one when it arrives. Nothing is written
//! to the remote store until the load has been installed.

mod snapshot;
mod writer;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use horno_core::{
    Cart, CartTotals, Identity, ProductDetails, ProductId, Quantity, SetQuantityOutcome,
};
use rust_decimal::Decimal;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use crate::catalog::ProductCatalog;
use crate::config::CartClientConfig;
use crate::enrichment::{Enriched, enrich};
use crate::repository::{CartRepository, StoredLine};
use crate::telemetry;

pub use snapshot::{CartEvent, CartSnapshot, LoadPhase};
use writer::{WriteOp, WriteQueue};

/// Tunables for a [`CartStore`].
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub tax_rate: Decimal,
    pub event_buffer: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            tax_rate: CartTotals::DEFAULT_TAX_RATE,
            event_buffer: CartClientConfig::DEFAULT_EVENT_BUFFER,
        }
    }
}

impl From<&CartClientConfig> for StoreOptions {
    fn from(config: &CartClientConfig) -> Self {
        Self {
            tax_rate: config.tax_rate,
            event_buffer: config.event_buffer,
        }
    }
}

/// Permission to install the result of one stored-cart load.
///
/// Returned by [`CartStore::begin_session`]; stale once another session
/// transition happens.
#[derive(Debug)]
#[must_use = "the stored cart is only loaded once the ticket is passed to complete_load"]
pub struct LoadTicket {
    epoch: u64,
    identity: Identity,
}

impl LoadTicket {
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// How a [`CartStore::complete_load`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The stored cart was installed.
    Installed,
    /// The stored cart could not be read. The session started from an empty
    /// cart, and a later save will overwrite whatever the backend holds.
    Failed,
    /// The session moved on, or the ticket was already used; nothing changed.
    Superseded,
}

/// A mutation recorded while a load was in flight.
#[derive(Debug, Clone)]
enum Mutation {
    Add(ProductDetails),
    Remove(ProductId),
    SetQuantity(ProductId, Quantity),
    Clear,
}

#[derive(Debug, Default)]
struct StoreState {
    cart: Cart,
    identity: Option<Identity>,
    epoch: u64,
    /// Present while a load for `epoch` is in flight.
    replay: Option<Vec<Mutation>>,
}

impl StoreState {
    fn phase(&self) -> LoadPhase {
        if self.replay.is_some() {
            LoadPhase::Loading
        } else {
            LoadPhase::Ready
        }
    }

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            cart: self.cart.clone(),
            identity: self.identity.clone(),
            phase: self.phase(),
        }
    }

    /// The identity writes should go to, if any.
    fn write_target(&self) -> Option<&Identity> {
        self.identity
            .as_ref()
            .filter(|identity| identity.is_persistable() && self.replay.is_none())
    }

    fn apply(&mut self, mutation: &Mutation) -> Option<CartEvent> {
        match mutation {
            Mutation::Add(details) => {
                let product_id = details.id;
                let quantity = self.cart.add(details.clone());
                Some(CartEvent::ItemAdded {
                    product_id,
                    quantity,
                })
            }
            Mutation::Remove(product_id) => self
                .cart
                .remove(*product_id)
                .map(|_| CartEvent::ItemRemoved {
                    product_id: *product_id,
                }),
            Mutation::SetQuantity(product_id, quantity) => {
                match self.cart.set_quantity(*product_id, *quantity) {
                    SetQuantityOutcome::Removed => Some(CartEvent::ItemRemoved {
                        product_id: *product_id,
                    }),
                    SetQuantityOutcome::Updated(quantity) => Some(CartEvent::QuantityChanged {
                        product_id: *product_id,
                        quantity,
                    }),
                    SetQuantityOutcome::NotInCart | SetQuantityOutcome::Unchanged => None,
                }
            }
            Mutation::Clear => {
                self.cart.clear();
                Some(CartEvent::Cleared)
            }
        }
    }
}

/// The cart store.
///
/// Cheaply cloneable; clones share the same cart. Must be created inside a
/// tokio runtime, since it spawns its persistence writer.
pub struct CartStore<C, R> {
    inner: Arc<StoreInner<C, R>>,
}

impl<C, R> Clone for CartStore<C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<C, R> {
    catalog: Arc<C>,
    repository: Arc<R>,
    state: Mutex<StoreState>,
    snapshots: watch::Sender<CartSnapshot>,
    events: broadcast::Sender<CartEvent>,
    writer: WriteQueue,
    tax_rate: Decimal,
}

impl<C: ProductCatalog, R: CartRepository> CartStore<C, R> {
    /// Create a guest store with default options.
    #[must_use]
    pub fn new(catalog: C, repository: R) -> Self {
        Self::with_options(catalog, repository, StoreOptions::default())
    }

    /// Create a guest store.
    #[must_use]
    pub fn with_options(catalog: C, repository: R, options: StoreOptions) -> Self {
        let repository = Arc::new(repository);
        let writer = WriteQueue::spawn(Arc::clone(&repository));
        let (snapshots, _) = watch::channel(CartSnapshot::default());
        let (events, _) = broadcast::channel(options.event_buffer.max(1));

        Self {
            inner: Arc::new(StoreInner {
                catalog: Arc::new(catalog),
                repository,
                state: Mutex::new(StoreState::default()),
                snapshots,
                events,
                writer,
                tax_rate: options.tax_rate,
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The current cart.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Live view of the cart; always holds the latest snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Stream of every change from now on.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.snapshots.borrow().item_count()
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.inner.snapshots.borrow().total()
    }

    /// Subtotal, tax and grand total at the configured tax rate.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.inner.snapshots.borrow().totals(self.inner.tax_rate)
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.snapshots.borrow().identity.clone()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product.
    pub fn add_item(&self, details: ProductDetails) {
        telemetry::add_breadcrumb(
            "cart",
            "Added product",
            &[("product_id", details.id.to_string())],
        );
        self.mutate(Mutation::Add(details));
    }

    /// Remove a product's row; no-op if it is not in the cart.
    pub fn remove_item(&self, product_id: ProductId) {
        telemetry::add_breadcrumb(
            "cart",
            "Removed product",
            &[("product_id", product_id.to_string())],
        );
        self.mutate(Mutation::Remove(product_id));
    }

    /// Set a row's quantity. Negative values clamp to zero, and zero removes
    /// the row. Never creates a row.
    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) {
        self.set_coerced_quantity(product_id, Quantity::clamp(quantity));
    }

    /// Set a row's quantity from raw text input.
    ///
    /// Fractions truncate, negatives clamp to zero, and input that is not a
    /// number is ignored.
    pub fn set_quantity_input(&self, product_id: ProductId, raw: &str) {
        match Quantity::parse_input(raw) {
            Some(quantity) => self.set_coerced_quantity(product_id, quantity),
            None => debug!(product_id = %product_id, input = raw, "Ignoring non-numeric quantity"),
        }
    }

    fn set_coerced_quantity(&self, product_id: ProductId, quantity: Quantity) {
        telemetry::add_breadcrumb(
            "cart",
            "Changed quantity",
            &[
                ("product_id", product_id.to_string()),
                ("quantity", quantity.to_string()),
            ],
        );
        self.mutate(Mutation::SetQuantity(product_id, quantity));
    }

    /// Empty the cart and remove the stored record for the active identity.
    pub fn clear(&self) {
        telemetry::add_breadcrumb("cart", "Cleared cart", &[]);

        let mut state = self.lock();
        state.apply(&Mutation::Clear);
        if let Some(replay) = state.replay.as_mut() {
            replay.push(Mutation::Clear);
        } else if let Some(identity) = state.write_target() {
            self.inner.writer.enqueue(WriteOp::Delete {
                identity: identity.clone(),
            });
        }
        self.publish(&state, Some(CartEvent::Cleared));
    }

    /// Wait until every persistence write queued so far has been attempted.
    pub async fn flush(&self) {
        self.inner.writer.flush().await;
    }

    fn mutate(&self, mutation: Mutation) {
        let mut state = self.lock();
        let Some(event) = state.apply(&mutation) else {
            return;
        };

        if let Some(replay) = state.replay.as_mut() {
            replay.push(mutation);
        } else {
            self.queue_save(&state);
        }
        self.publish(&state, Some(event));
    }

    // =========================================================================
    // Session transitions
    // =========================================================================

    /// Switch the store to `identity` and load its stored cart.
    ///
    /// Equivalent to [`begin_session`](Self::begin_session) followed by
    /// [`complete_load`](Self::complete_load).
    pub async fn rebind(&self, identity: Option<Identity>) {
        if let Some(ticket) = self.begin_session(identity) {
            self.complete_load(ticket).await;
        }
    }

    /// Apply the synchronous half of a session transition.
    ///
    /// If the identity changed, the previous cart is discarded and an empty
    /// snapshot is published immediately. Returns a ticket when the new
    /// identity has a stored cart to load. On logout the repository is told
    /// to forget the previous identity.
    #[instrument(skip_all, fields(user_id = ?identity.as_ref().map(|i| i.id)))]
    pub fn begin_session(&self, identity: Option<Identity>) -> Option<LoadTicket> {
        let mut state = self.lock();
        if state.identity == identity {
            debug!("Session unchanged");
            return None;
        }

        let previous = std::mem::replace(&mut state.identity, identity.clone());
        state.epoch += 1;
        state.cart.clear();
        state.replay = None;

        let ticket = match &identity {
            Some(next) if next.is_persistable() => {
                state.replay = Some(Vec::new());
                Some(LoadTicket {
                    epoch: state.epoch,
                    identity: next.clone(),
                })
            }
            _ => None,
        };

        match &identity {
            Some(next) => telemetry::set_sentry_user(next),
            None => {
                telemetry::clear_sentry_user();
                if let Some(previous) = previous.filter(Identity::is_persistable) {
                    self.inner
                        .writer
                        .enqueue(WriteOp::Forget { identity: previous });
                }
            }
        }

        info!(epoch = state.epoch, loading = ticket.is_some(), "Session changed, cart discarded");
        self.publish(
            &state,
            Some(CartEvent::SessionChanged {
                user_id: identity.as_ref().map(|i| i.id),
            }),
        );
        ticket
    }

    /// Load, enrich and install the stored cart for a ticket.
    ///
    /// A failed load still installs an empty cart so the session can go on,
    /// but is reported as [`LoadOutcome::Failed`] and in the
    /// [`CartEvent::Loaded`] event.
    #[instrument(skip_all, fields(user_id = %ticket.identity.id, epoch = ticket.epoch))]
    pub async fn complete_load(&self, ticket: LoadTicket) -> LoadOutcome {
        let (lines, failed) = match self.inner.repository.load(&ticket.identity).await {
            Ok(lines) => (lines, false),
            Err(e) => {
                warn!(error = %e, "Failed to load stored cart, starting empty");
                (Vec::new(), true)
            }
        };

        let enriched = enrich(Arc::clone(&self.inner.catalog), lines).await;
        if !self.install(&ticket, enriched, failed) {
            return LoadOutcome::Superseded;
        }
        if failed {
            LoadOutcome::Failed
        } else {
            LoadOutcome::Installed
        }
    }

    fn install(&self, ticket: &LoadTicket, enriched: Enriched, failed: bool) -> bool {
        let mut state = self.lock();
        if state.epoch != ticket.epoch {
            debug!(
                current_epoch = state.epoch,
                "Discarding stored cart for a superseded session"
            );
            return false;
        }
        let Some(replay) = state.replay.take() else {
            debug!("Stored cart already installed for this session");
            return false;
        };

        let items = enriched.items.len();
        state.cart = Cart::from_items(enriched.items);
        for mutation in &replay {
            state.apply(mutation);
        }

        // A clear made while loading must also remove the stored record
        let cleared = replay.iter().any(|m| matches!(m, Mutation::Clear));
        if let Some(identity) = state.write_target().filter(|_| cleared) {
            self.inner.writer.enqueue(WriteOp::Delete {
                identity: identity.clone(),
            });
        }
        if !replay.is_empty() {
            debug!(replayed = replay.len(), cleared, "Replayed mutations made while loading");
            if !(cleared && state.cart.is_empty()) {
                self.queue_save(&state);
            }
        }

        info!(items, degraded = enriched.degraded, failed, "Stored cart installed");
        self.publish(
            &state,
            Some(CartEvent::Loaded {
                user_id: ticket.identity.id,
                items,
                degraded: enriched.degraded,
                failed,
            }),
        );
        true
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn queue_save(&self, state: &StoreState) {
        if let Some(identity) = state.write_target() {
            self.inner.writer.enqueue(WriteOp::Save {
                identity: identity.clone(),
                lines: state.cart.items().iter().map(StoredLine::from).collect(),
            });
        }
    }

    /// Publish the state under the lock, so observers see changes in order.
    fn publish(&self, state: &StoreState, event: Option<CartEvent>) {
        self.inner.snapshots.send_replace(state.snapshot());
        if let Some(event) = event {
            // No receivers is fine
            let _ = self.inner.events.send(event);
        }
    }
}
