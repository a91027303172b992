//! Horno Core - Shared types library.
//!
//! This crate provides the types shared by every Horno component:
//! - `cart` - Cart synchronization engine (catalog, persistence, session binding)
//! - `cli` - Command-line tools for inspecting and editing carts
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no HTTP
//! clients, no async runtime. The [`Cart`] aggregate and its invariants live
//! here so they can be tested without any collaborators.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, emails, prices, identities, line items and the cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
