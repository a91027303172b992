//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HORNO_API_BASE_URL` - Base URL of the storefront API (e.g. `http://localhost:5000/api`)
//!
//! ## Optional
//! - `HORNO_ASSET_BASE_URL` - Base URL for product images (default: API base without `/api`)
//! - `HORNO_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `HORNO_CATALOG_CACHE_TTL_SECS` - Product cache TTL (default: 300)
//! - `HORNO_CATALOG_CACHE_CAPACITY` - Product cache size (default: 1000)
//! - `HORNO_TAX_RATE` - Sales tax rate applied to cart totals (default: 0.16)
//! - `HORNO_EVENT_BUFFER` - Cart event channel capacity (default: 64)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::str::FromStr;
use std::time::Duration;

use horno_core::CartTotals;
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct CartClientConfig {
    /// Storefront API base, without a trailing slash
    pub api_base_url: Url,
    /// Base that relative product image paths are joined onto
    pub asset_base_url: Url,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Product lookup cache settings
    pub catalog_cache: CatalogCacheConfig,
    /// Tax rate used for checkout totals
    pub tax_rate: Decimal,
    /// Capacity of the cart event broadcast channel
    pub event_buffer: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Product lookup cache settings.
#[derive(Debug, Clone, Copy)]
pub struct CatalogCacheConfig {
    pub max_capacity: u64,
    pub time_to_live: Duration,
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            time_to_live: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl CartClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_EVENT_BUFFER: usize = 64;

    /// Configuration for `api_base_url` with every optional setting at its default.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        let api_base_url = strip_trailing_slash(api_base_url);
        let asset_base_url = default_asset_base(&api_base_url);
        Self {
            api_base_url,
            asset_base_url,
            request_timeout: Self::DEFAULT_TIMEOUT,
            catalog_cache: CatalogCacheConfig::default(),
            tax_rate: CartTotals::DEFAULT_TAX_RATE,
            event_buffer: Self::DEFAULT_EVENT_BUFFER,
            sentry_dsn: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let api_base_url = env.url("HORNO_API_BASE_URL")?;
        let mut config = Self::new(api_base_url);

        if let Some(asset_base_url) = env.optional_url("HORNO_ASSET_BASE_URL")? {
            config.asset_base_url = strip_trailing_slash(asset_base_url);
        }
        config.request_timeout = Duration::from_secs(
            env.parsed_or("HORNO_HTTP_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT.as_secs())?,
        );
        config.catalog_cache = CatalogCacheConfig {
            max_capacity: env.parsed_or(
                "HORNO_CATALOG_CACHE_CAPACITY",
                config.catalog_cache.max_capacity,
            )?,
            time_to_live: Duration::from_secs(env.parsed_or(
                "HORNO_CATALOG_CACHE_TTL_SECS",
                config.catalog_cache.time_to_live.as_secs(),
            )?),
        };
        config.tax_rate = env.parsed_or("HORNO_TAX_RATE", CartTotals::DEFAULT_TAX_RATE)?;
        if config.tax_rate.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "HORNO_TAX_RATE".to_string(),
                "must not be negative".to_string(),
            ));
        }
        config.event_buffer = env.parsed_or("HORNO_EVENT_BUFFER", Self::DEFAULT_EVENT_BUFFER)?;
        if config.event_buffer == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "HORNO_EVENT_BUFFER".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        config.sentry_dsn = env.optional("SENTRY_DSN");

        Ok(config)
    }

    /// Absolute URL for an API path such as `products/7`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn url(&self, key: &str) -> Result<Url, ConfigError> {
        parse_url(key, &self.required(key)?)
    }

    fn optional_url(&self, key: &str) -> Result<Option<Url>, ConfigError> {
        self.optional(key).map(|raw| parse_url(key, &raw)).transpose()
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn strip_trailing_slash(mut url: Url) -> Url {
    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&trimmed);
    url
}

/// The API base with a trailing `/api` segment removed.
fn default_asset_base(api_base_url: &Url) -> Url {
    let mut asset_base = api_base_url.clone();
    if let Some(stripped) = api_base_url.path().strip_suffix("/api") {
        let stripped = stripped.to_string();
        asset_base.set_path(&stripped);
    }
    asset_base
}
