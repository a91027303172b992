//! Horno cart synchronization engine.
//!
//! Keeps the shopper's cart in memory, mirrors it to the per-user remote
//! store, and rebuilds it from that store on login.
//!
//! # Modules
//!
//! - [`config`] - Endpoint and tuning configuration from the environment
//! - [`catalog`] - Product lookups with an in-memory cache
//! - [`repository`] - Remote per-user cart persistence
//! - [`enrichment`] - Concurrent hydration of stored rows into line items
//! - [`store`] - The cart store and its observers
//! - [`session`] - Binding the store to the authenticated identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod repository;
pub mod session;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use catalog::{CatalogError, HttpCatalog, ProductCatalog};
pub use config::{CartClientConfig, ConfigError};
pub use repository::{CartRepository, HttpCartRepository, RepositoryError, StoredLine};
pub use session::{SessionSignal, bind_session};
pub use store::{
    CartEvent, CartSnapshot, CartStore, LoadOutcome, LoadPhase, LoadTicket, StoreOptions,
};
