//! Stored cart commands.
//!
//! Each command logs in as the given shopper, lets the cart store load and
//! enrich the stored cart, applies the change, and waits for the write to
//! reach the remote store before printing the result. If the stored cart
//! cannot be read the command fails before anything is written.
//!
//! # Usage
//!
//! ```bash
//! horno cart show --user-id 42 --email ana@horno.mx
//! horno cart add --user-id 42 --email ana@horno.mx 7 --quantity 2
//! horno cart set --user-id 42 --email ana@horno.mx 7 3
//! horno cart clear --user-id 42 --email ana@horno.mx
//! ```
//!
//! # Environment Variables
//!
//! - `HORNO_API_BASE_URL` - Storefront API base URL (required)

use horno_cart::{
    CartClientConfig, CartSnapshot, CartStore, HttpCartRepository, HttpCatalog, LoadOutcome,
    ProductCatalog, StoreOptions,
};
use horno_core::{CartTotals, Email, Identity, LineItem, ProductId, UserId};
use serde::Serialize;

use super::CommandError;

type HttpCartStore = CartStore<HttpCatalog, HttpCartRepository>;

/// A change to apply to the stored cart.
#[derive(Debug, Clone)]
pub enum CartChange {
    Add { product_id: ProductId, quantity: u32 },
    Set { product_id: ProductId, quantity: String },
    Clear,
}

/// Cart as printed with `--json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartView<'a> {
    user_id: UserId,
    items: &'a [LineItem],
    item_count: u64,
    #[serde(flatten)]
    totals: CartTotals,
}

/// Print the stored cart for a shopper.
pub async fn show(
    config: &CartClientConfig,
    user_id: i32,
    email: &str,
    json: bool,
) -> Result<(), CommandError> {
    let (store, _, identity) = open(config, user_id, email).await?;
    print_cart(&store.snapshot(), &identity, config, json)
}

/// Apply a change to the stored cart and print the result.
pub async fn apply(
    config: &CartClientConfig,
    user_id: i32,
    email: &str,
    change: CartChange,
    json: bool,
) -> Result<(), CommandError> {
    let (store, catalog, identity) = open(config, user_id, email).await?;

    match change {
        CartChange::Add {
            product_id,
            quantity,
        } => {
            let details = catalog.resolve(product_id).await?;
            let before = store
                .snapshot()
                .cart
                .get(product_id)
                .map_or(0, |item| item.quantity);

            store.add_item(details);
            if quantity > 1 {
                store.set_quantity(product_id, i64::from(before) + i64::from(quantity));
            }
        }
        CartChange::Set {
            product_id,
            quantity,
        } => {
            if store.snapshot().cart.get(product_id).is_none() {
                tracing::warn!(product_id = %product_id, "Product is not in the cart, nothing to update");
            }
            store.set_quantity_input(product_id, &quantity);
        }
        CartChange::Clear => store.clear(),
    }

    store.flush().await;
    print_cart(&store.snapshot(), &identity, config, json)
}

/// Build the store and load the shopper's cart.
///
/// The returned catalog shares its HTTP client and product cache with the
/// store.
async fn open(
    config: &CartClientConfig,
    user_id: i32,
    email: &str,
) -> Result<(HttpCartStore, HttpCatalog, Identity), CommandError> {
    let identity = Identity::new(UserId::new(user_id), Email::parse(email)?);
    if !identity.is_persistable() {
        tracing::warn!(user_id, "User id is not persistable, working on a guest cart");
    }

    let catalog = HttpCatalog::new(config)?;
    let store = CartStore::with_options(
        catalog.clone(),
        HttpCartRepository::new(config)?,
        StoreOptions::from(config),
    );
    if let Some(ticket) = store.begin_session(Some(identity.clone()))
        && store.complete_load(ticket).await == LoadOutcome::Failed
    {
        return Err(CommandError::LoadFailed(identity.id));
    }
    Ok((store, catalog, identity))
}

#[allow(clippy::print_stdout)]
fn print_cart(
    snapshot: &CartSnapshot,
    identity: &Identity,
    config: &CartClientConfig,
    json: bool,
) -> Result<(), CommandError> {
    let totals = snapshot.totals(config.tax_rate);

    if json {
        let view = CartView {
            user_id: identity.id,
            items: snapshot.items(),
            item_count: snapshot.item_count(),
            totals,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Cart for {} (user {})", identity.email, identity.id);
    if snapshot.cart.is_empty() {
        println!("  (empty)");
        return Ok(());
    }

    for item in snapshot.items() {
        println!(
            "  {:>3} x #{:<5} {:<30} {:>10}",
            item.quantity,
            item.product_id,
            item.name,
            item.unit_price.to_string()
        );
    }
    println!("  Items:    {}", snapshot.item_count());
    println!("  Subtotal: ${:.2}", totals.subtotal);
    println!("  Tax:      ${:.2}", totals.tax);
    println!("  Total:    ${:.2}", totals.grand_total);
    Ok(())
}
