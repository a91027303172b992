//! Turns stored `(product_id, quantity)` rows into displayable line items.
//!
//! Every lookup runs as its own task and the batch is joined once, after all
//! of them finish. A failed lookup never aborts the batch: the row is kept
//! as a degraded item with its id and quantity intact.

use std::sync::Arc;

use futures::future::join_all;
use horno_core::{Cart, LineItem, ProductId};
use tracing::{debug, instrument, warn};

use crate::catalog::ProductCatalog;
use crate::repository::StoredLine;

/// Outcome of enriching a stored cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enriched {
    pub items: Vec<LineItem>,
    /// How many rows fell back to the degraded representation.
    pub degraded: usize,
}

/// Resolve every stored row against the catalog, concurrently.
///
/// Rows with a non-positive quantity are dropped and rows repeating a
/// product id are merged before any lookup is issued. Output order matches
/// the first appearance of each product in `lines`.
#[instrument(skip(catalog, lines), fields(lines = lines.len()))]
pub async fn enrich<C: ProductCatalog>(catalog: Arc<C>, lines: Vec<StoredLine>) -> Enriched {
    let wanted = normalize(lines);
    if wanted.is_empty() {
        return Enriched::default();
    }

    let handles: Vec<_> = wanted
        .iter()
        .map(|&(product_id, _)| {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.resolve(product_id).await })
        })
        .collect();

    let results = join_all(handles).await;

    let mut degraded = 0;
    let items = wanted
        .into_iter()
        .zip(results)
        .map(|((product_id, quantity), result)| match result {
            Ok(Ok(details)) => LineItem::from_details(details, quantity),
            Ok(Err(e)) => {
                warn!(product_id = %product_id, error = %e, "Product lookup failed, keeping degraded item");
                degraded += 1;
                LineItem::degraded(product_id, quantity)
            }
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Product lookup task aborted, keeping degraded item");
                degraded += 1;
                LineItem::degraded(product_id, quantity)
            }
        })
        .collect();

    debug!(degraded, "Stored cart enriched");
    Enriched { items, degraded }
}

/// Drop unusable rows and merge duplicates, preserving first-seen order.
fn normalize(lines: Vec<StoredLine>) -> Vec<(ProductId, u32)> {
    let rows = lines.into_iter().filter_map(|line| {
        let quantity = u32::try_from(line.quantity).ok().filter(|&q| q > 0);
        if quantity.is_none() {
            debug!(product_id = %line.product_id, quantity = line.quantity, "Dropping stored row with unusable quantity");
        }
        quantity.map(|q| LineItem::degraded(line.product_id, q))
    });

    Cart::from_items(rows)
        .items()
        .iter()
        .map(|item| (item.product_id, item.quantity))
        .collect()
}
