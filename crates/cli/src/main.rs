//! Horno CLI - Inspect and edit stored carts.
//!
//! # Usage
//!
//! ```bash
//! # Look up a product through the catalog
//! horno product show 7
//!
//! # Print a shopper's stored cart with totals
//! horno cart show --user-id 42 --email ana@horno.mx
//!
//! # Add two units of product 7
//! horno cart add --user-id 42 --email ana@horno.mx 7 --quantity 2
//!
//! # Set a quantity (0 removes the row)
//! horno cart set --user-id 42 --email ana@horno.mx 7 3
//!
//! # Empty the cart and delete the stored record
//! horno cart clear --user-id 42 --email ana@horno.mx
//! ```
//!
//! # Commands
//!
//! - `product show` - Resolve a product id
//! - `cart show|add|set|clear` - Read or change a stored cart
//!
//! # Environment Variables
//!
//! - `HORNO_API_BASE_URL` - Storefront API base URL (required)
//! - `HORNO_LOG_FORMAT` - `json` for structured log lines on stderr
//! - `SENTRY_DSN` - Enables error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use horno_cart::CartClientConfig;
use horno_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::cart::CartChange;

mod commands;

#[derive(Parser)]
#[command(name = "horno")]
#[command(author, version, about = "Horno cart tools")]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Read or change a stored cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Resolve a product id through the catalog
    Show {
        /// Product id
        id: i32,
    },
}

/// The shopper whose cart is addressed.
#[derive(Args)]
struct Shopper {
    /// Shopper user id
    #[arg(short, long)]
    user_id: i32,

    /// Shopper email address
    #[arg(short, long)]
    email: String,
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the stored cart
    Show {
        #[command(flatten)]
        shopper: Shopper,
    },
    /// Add a product to the cart
    Add {
        #[command(flatten)]
        shopper: Shopper,

        /// Product id
        product_id: i32,

        /// Units to add (at least 1)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
    },
    /// Set the quantity of a product already in the cart
    Set {
        #[command(flatten)]
        shopper: Shopper,

        /// Product id
        product_id: i32,

        /// New quantity (fractions truncate, 0 or less removes)
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Empty the cart
    Clear {
        #[command(flatten)]
        shopper: Shopper,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration first so Sentry can be initialized before tracing
    let config = commands::load_config();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to warnings from the engine and info from the CLI itself
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "horno_cart=warn,horno=info".into());
    let json_logs = std::env::var("HORNO_LOG_FORMAT").is_ok_and(|format| format == "json");
    tracing_subscriber::registry()
        .with(env_filter)
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartClientConfig) -> Result<(), commands::CommandError> {
    let json = cli.json;
    match cli.command {
        Commands::Product { action } => match action {
            ProductAction::Show { id } => {
                commands::product::show(config, ProductId::new(id), json).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show { shopper } => {
                commands::cart::show(config, shopper.user_id, &shopper.email, json).await?;
            }
            CartAction::Add {
                shopper,
                product_id,
                quantity,
            } => {
                let change = CartChange::Add {
                    product_id: ProductId::new(product_id),
                    quantity,
                };
                commands::cart::apply(config, shopper.user_id, &shopper.email, change, json)
                    .await?;
            }
            CartAction::Set {
                shopper,
                product_id,
                quantity,
            } => {
                let change = CartChange::Set {
                    product_id: ProductId::new(product_id),
                    quantity,
                };
                commands::cart::apply(config, shopper.user_id, &shopper.email, change, json)
                    .await?;
            }
            CartAction::Clear { shopper } => {
                commands::cart::apply(
                    config,
                    shopper.user_id,
                    &shopper.email,
                    CartChange::Clear,
                    json,
                )
                .await?;
            }
        },
    }
    Ok(())
}
