//! End-to-end cart synchronization over HTTP.
//!
//! Each test drives a `CartStore` wired to the real catalog and repository
//! clients, with `MockBackend` standing in for the storefront API.

#![allow(clippy::unwrap_used)]

use horno_cart::{
    CartEvent, HttpCatalog, LoadOutcome, ProductCatalog, SessionSignal, bind_session,
};
use horno_core::{Email, Identity, ProductId, UserId};
use horno_integration_tests::{MockBackend, Recorded};
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn shopper(id: i32) -> Identity {
    Identity::new(UserId::new(id), Email::parse("ana@horno.mx").unwrap())
}

/// `(productId, quantity)` pairs of a saved item list.
fn pairs(items: &Value) -> Vec<(i64, i64)> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["productId"].as_i64().unwrap(),
                item["quantity"].as_i64().unwrap(),
            )
        })
        .collect()
}

// =============================================================================
// Guest
// =============================================================================

#[tokio::test]
async fn test_guest_cart_stays_local() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(7, "Pastel", 35);
    let store = backend.store();

    let catalog = HttpCatalog::new(&backend.config()).unwrap();
    let pastel = catalog.resolve(ProductId::new(7)).await.unwrap();
    backend.clear_requests();

    store.add_item(pastel.clone());
    store.add_item(pastel);
    store.flush().await;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.items().len(), 1);
    assert_eq!(snapshot.items()[0].quantity, 2);
    assert_eq!(store.total(), Decimal::from(70));
    assert!(backend.requests().is_empty());
}

// =============================================================================
// Logged in
// =============================================================================

#[tokio::test]
async fn test_login_restores_stored_cart() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(7, "Pastel", 35);
    backend.store_cart(42, json!([{ "productId": 7, "quantity": 2 }]));
    let store = backend.store();

    store.rebind(Some(shopper(42))).await;

    let snapshot = store.snapshot();
    assert!(!snapshot.is_loading());
    assert_eq!(snapshot.items().len(), 1);
    let item = &snapshot.items()[0];
    assert_eq!(item.product_id, ProductId::new(7));
    assert_eq!(item.quantity, 2);
    assert_eq!(item.name, "Pastel");
    assert_eq!(store.total(), Decimal::from(70));
    assert_eq!(
        backend.requests(),
        vec![Recorded::GetCart(42), Recorded::GetProduct(7)]
    );
}

#[tokio::test]
async fn test_setting_zero_saves_reduced_list() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(7, "Pastel", 35);
    backend.add_simple_product(3, "Concha", 8);
    backend.store_cart(
        42,
        json!([
            { "productId": 7, "quantity": 2 },
            { "productId": 3, "quantity": 1 }
        ]),
    );
    let store = backend.store();
    store.rebind(Some(shopper(42))).await;

    store.set_quantity(ProductId::new(7), 0);
    store.flush().await;

    assert_eq!(store.total(), Decimal::from(8));
    let writes = backend.cart_writes();
    assert_eq!(writes.len(), 1);
    let Recorded::SaveCart { user_id, items } = &writes[0] else {
        panic!("expected a save, got {writes:?}");
    };
    assert_eq!(*user_id, 42);
    assert_eq!(pairs(items), vec![(3, 1)]);
}

#[tokio::test]
async fn test_failed_lookup_keeps_degraded_row() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(1, "Bolillo", 3);
    backend.add_simple_product(3, "Dona", 12);
    backend.fail_product(2);
    backend.store_cart(
        42,
        json!([
            { "productId": 1, "quantity": 1 },
            { "productId": 2, "quantity": 5 },
            { "productId": 3, "quantity": 2 }
        ]),
    );
    let store = backend.store();
    let mut events = store.events();

    store.rebind(Some(shopper(42))).await;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.items().len(), 3);
    let failed = &snapshot.items()[1];
    assert_eq!(failed.product_id, ProductId::new(2));
    assert_eq!(failed.quantity, 5);
    assert_eq!(failed.line_total(), Decimal::ZERO);
    assert_eq!(store.total(), Decimal::from(27));

    let mut loaded = None;
    while let Ok(event) = events.try_recv() {
        if let CartEvent::Loaded { degraded, .. } = event {
            loaded = Some(degraded);
        }
    }
    assert_eq!(loaded, Some(1));
}

#[tokio::test]
async fn test_legacy_stored_rows_are_understood() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(7, "Pastel", 35);
    backend.store_cart(
        42,
        json!([
            { "producto_id": 7, "cantidad": 3 },
            { "producto_id": 8, "cantidad": 0 }
        ]),
    );
    let store = backend.store();

    store.rebind(Some(shopper(42))).await;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.items().len(), 1);
    assert_eq!(snapshot.item_count(), 3);
    assert!(!backend.requests().contains(&Recorded::GetProduct(8)));
}

#[tokio::test]
async fn test_clear_deletes_stored_cart() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(7, "Pastel", 35);
    backend.store_cart(42, json!([{ "productId": 7, "quantity": 2 }]));
    let store = backend.store();
    store.rebind(Some(shopper(42))).await;

    store.clear();
    store.flush().await;

    assert!(store.snapshot().cart.is_empty());
    assert_eq!(backend.cart_writes(), vec![Recorded::DeleteCart(42)]);
    assert!(backend.stored_cart(42).is_none());
}

#[tokio::test]
async fn test_unreadable_stored_cart_is_reported() {
    let backend = MockBackend::start().await;
    backend.store_cart(42, json!([{ "productId": 7, "quantity": 2 }]));
    backend.fail_cart_loads(42);
    let store = backend.store();
    let mut events = store.events();

    let ticket = store.begin_session(Some(shopper(42)));
    let outcome = store.complete_load(ticket.unwrap()).await;
    store.flush().await;

    assert_eq!(outcome, LoadOutcome::Failed);
    assert!(store.snapshot().cart.is_empty());
    let mut reported = None;
    while let Ok(event) = events.try_recv() {
        if let CartEvent::Loaded { failed, .. } = event {
            reported = Some(failed);
        }
    }
    assert_eq!(reported, Some(true));
    assert!(backend.cart_writes().is_empty());
    assert_eq!(pairs(&backend.stored_cart(42).unwrap()), vec![(7, 2)]);
}

#[tokio::test]
async fn test_switching_users_never_leaks_items() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(7, "Pastel", 35);
    backend.store_cart(1, json!([{ "productId": 7, "quantity": 2 }]));
    let store = backend.store();
    store.rebind(Some(shopper(1))).await;
    assert_eq!(store.item_count(), 2);

    let ticket = store.begin_session(Some(shopper(2)));
    assert!(store.snapshot().cart.is_empty());

    store.complete_load(ticket.unwrap()).await;
    assert!(store.snapshot().cart.is_empty());
    assert!(backend.cart_writes().is_empty());
}

// =============================================================================
// Session binding
// =============================================================================

#[tokio::test]
async fn test_bound_store_follows_session() {
    let backend = MockBackend::start().await;
    backend.add_simple_product(7, "Pastel", 35);
    backend.store_cart(42, json!([{ "productId": 7, "quantity": 2 }]));
    let store = backend.store();
    let mut snapshots = store.subscribe();

    let session = SessionSignal::new();
    let _binding = bind_session(store.clone(), session.subscribe());

    session.login(shopper(42));
    snapshots
        .wait_for(|s| s.identity.is_some() && !s.is_loading())
        .await
        .unwrap();
    assert_eq!(store.total(), Decimal::from(70));

    let pastel = store.snapshot().items()[0].clone();
    store.set_quantity(pastel.product_id, 5);
    store.flush().await;
    assert_eq!(pairs(&backend.stored_cart(42).unwrap()), vec![(7, 5)]);

    session.logout();
    snapshots.wait_for(|s| s.identity.is_none()).await.unwrap();
    assert!(store.snapshot().cart.is_empty());
    assert_eq!(pairs(&backend.stored_cart(42).unwrap()), vec![(7, 5)]);
}
