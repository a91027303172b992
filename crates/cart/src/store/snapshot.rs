//! What observers of the cart store see.

use horno_core::{Cart, CartTotals, Identity, LineItem, ProductId, UserId};
use rust_decimal::Decimal;

/// Whether the store is waiting on a stored cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// The cart reflects the active session.
    #[default]
    Ready,
    /// A stored cart is being fetched and enriched; the cart shown is the
    /// transitional one.
    Loading,
}

/// Immutable view of the cart at one instant.
///
/// The total is derived from the rows on every call, so it cannot drift
/// from what is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub identity: Option<Identity>,
    pub phase: LoadPhase,
}

impl CartSnapshot {
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// Sum of quantities, for the header badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn totals(&self, tax_rate: Decimal) -> CartTotals {
        CartTotals::compute(self.total(), tax_rate)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }
}

/// A change to the cart, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { product_id: ProductId, quantity: u32 },
    ItemRemoved { product_id: ProductId },
    QuantityChanged { product_id: ProductId, quantity: u32 },
    Cleared,
    /// The active identity changed and the previous cart was discarded.
    SessionChanged { user_id: Option<UserId> },
    /// A stored cart was installed. `failed` means it could not be read and
    /// the session started empty.
    Loaded {
        user_id: UserId,
        items: usize,
        degraded: usize,
        failed: bool,
    },
}
