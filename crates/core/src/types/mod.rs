//! Core types for Horno.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod email;
pub mod id;
pub mod identity;
pub mod line_item;
pub mod price;
pub mod quantity;
pub mod totals;

pub use cart::{Cart, SetQuantityOutcome};
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use line_item::{LineItem, ProductDetails};
pub use price::{Price, PriceError};
pub use quantity::Quantity;
pub use totals::CartTotals;
