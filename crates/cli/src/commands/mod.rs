//! Command implementations.

pub mod cart;
pub mod product;

use horno_cart::{CartClientConfig, CatalogError, ConfigError, RepositoryError};
use horno_core::UserId;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Product lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The cart store client could not be built.
    #[error("Cart store error: {0}")]
    Repository(#[from] RepositoryError),

    /// The stored cart could not be read, so changing it would overwrite
    /// rows that were never seen.
    #[error("Could not load the stored cart for user {0}")]
    LoadFailed(UserId),

    /// Invalid shopper email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] horno_core::EmailError),

    /// Output could not be encoded.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Load configuration from `.env` and the process environment.
pub fn load_config() -> Result<CartClientConfig, CommandError> {
    Ok(CartClientConfig::from_env()?)
}
