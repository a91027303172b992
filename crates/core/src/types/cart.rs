//! The cart aggregate.
//!
//! [`Cart`] is a plain ordered list of [`LineItem`]s with the two invariants
//! the rest of the system relies on:
//!
//! - at most one row per [`ProductId`]
//! - every row has `quantity >= 1`
//!
//! The total is never stored; [`Cart::total`] sums the rows on every call.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{LineItem, ProductDetails, ProductId, Quantity};

/// Result of [`Cart::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetQuantityOutcome {
    /// No row for that product; nothing was created.
    NotInCart,
    /// The quantity coerced to zero and the row was removed.
    Removed,
    /// The row now has the given quantity.
    Updated(u32),
    /// The row already had the requested quantity.
    Unchanged,
}

/// An ordered collection of line items, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from arbitrary rows, restoring the invariants.
    ///
    /// Rows with quantity zero are dropped. Rows repeating a product id are
    /// merged into the first occurrence by summing quantities.
    #[must_use]
    pub fn from_items(rows: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Self::new();
        for row in rows {
            if row.quantity == 0 {
                continue;
            }
            match cart.position(row.product_id) {
                Some(index) => {
                    if let Some(existing) = cart.items.get_mut(index) {
                        existing.quantity = existing.quantity.saturating_add(row.quantity);
                    }
                }
                None => cart.items.push(row),
            }
        }
        cart
    }

    /// Add one unit of a product, appending a new row if needed.
    ///
    /// Returns the row's quantity after the add.
    pub fn add(&mut self, details: ProductDetails) -> u32 {
        if let Some(existing) = self.get_mut(details.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return existing.quantity;
        }
        self.items.push(LineItem::from_details(details, 1));
        1
    }

    /// Remove the row for `product_id`, returning it if it was present.
    pub fn remove(&mut self, product_id: ProductId) -> Option<LineItem> {
        let index = self.position(product_id)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity of an existing row. Zero removes it.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: Quantity) -> SetQuantityOutcome {
        let Some(existing) = self.get_mut(product_id) else {
            return SetQuantityOutcome::NotInCart;
        };

        if quantity.is_zero() {
            self.remove(product_id);
            return SetQuantityOutcome::Removed;
        }
        if existing.quantity == quantity.get() {
            return SetQuantityOutcome::Unchanged;
        }
        existing.quantity = quantity.get();
        SetQuantityOutcome::Updated(quantity.get())
    }

    /// Remove every row, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of unit price times quantity over all rows, saturating at
    /// [`Decimal::MAX`].
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(LineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Sum of quantities, as shown on the header badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.product_id == product_id)
    }

    fn get_mut(&mut self, product_id: ProductId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.product_id == product_id)
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(items: Vec<LineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
