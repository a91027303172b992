//! Stored cart reads and writes against the mock storefront API.

#![allow(clippy::unwrap_used)]

use horno_cart::{CartRepository, HttpCartRepository, RepositoryError, StoredLine};
use horno_core::{Email, Identity, ProductId, UserId};
use horno_integration_tests::{MockBackend, Recorded};
use serde_json::json;

fn shopper(id: i32) -> Identity {
    Identity::new(UserId::new(id), Email::parse("luis@horno.mx").unwrap())
}

fn lines(rows: &[(i32, i64)]) -> Vec<StoredLine> {
    rows.iter()
        .map(|&(id, quantity)| StoredLine::new(ProductId::new(id), quantity))
        .collect()
}

#[tokio::test]
async fn test_load_missing_cart_is_empty() {
    let backend = MockBackend::start().await;
    let repository = HttpCartRepository::new(&backend.config()).unwrap();

    let loaded = repository.load(&shopper(42)).await.unwrap();

    assert!(loaded.is_empty());
    assert_eq!(backend.requests(), vec![Recorded::GetCart(42)]);
}

#[tokio::test]
async fn test_save_then_load_round_trips_rows() {
    let backend = MockBackend::start().await;
    let repository = HttpCartRepository::new(&backend.config()).unwrap();
    let rows = lines(&[(7, 2), (3, 1)]);

    repository.save(&shopper(42), &rows).await.unwrap();

    assert_eq!(
        backend.stored_cart(42),
        Some(json!([
            { "productId": 7, "quantity": 2 },
            { "productId": 3, "quantity": 1 }
        ]))
    );
    assert_eq!(repository.load(&shopper(42)).await.unwrap(), rows);
}

#[tokio::test]
async fn test_repeated_save_overwrites_other_writer() {
    let backend = MockBackend::start().await;
    let repository = HttpCartRepository::new(&backend.config()).unwrap();
    let ana = shopper(42);

    repository.save(&ana, &lines(&[(7, 2)])).await.unwrap();
    // Another device writes in between
    backend.store_cart(42, json!([{ "productId": 3, "quantity": 9 }]));
    repository.save(&ana, &lines(&[(7, 2)])).await.unwrap();

    assert_eq!(backend.cart_writes().len(), 2);
    assert_eq!(
        backend.stored_cart(42),
        Some(json!([{ "productId": 7, "quantity": 2 }]))
    );
}

#[tokio::test]
async fn test_save_after_delete_is_sent() {
    let backend = MockBackend::start().await;
    let repository = HttpCartRepository::new(&backend.config()).unwrap();
    let ana = shopper(42);
    let rows = lines(&[(7, 2)]);

    repository.save(&ana, &rows).await.unwrap();
    repository.delete(&ana).await.unwrap();
    assert!(backend.stored_cart(42).is_none());
    repository.save(&ana, &rows).await.unwrap();

    assert_eq!(
        backend.cart_writes(),
        vec![
            Recorded::SaveCart {
                user_id: 42,
                items: json!([{ "productId": 7, "quantity": 2 }]),
            },
            Recorded::DeleteCart(42),
            Recorded::SaveCart {
                user_id: 42,
                items: json!([{ "productId": 7, "quantity": 2 }]),
            },
        ]
    );
}

#[tokio::test]
async fn test_failed_load_is_an_error() {
    let backend = MockBackend::start().await;
    backend.store_cart(42, json!([{ "productId": 7, "quantity": 2 }]));
    backend.fail_cart_loads(42);
    let repository = HttpCartRepository::new(&backend.config()).unwrap();

    let err = repository.load(&shopper(42)).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Server { status: 500, .. }));
}

#[tokio::test]
async fn test_carts_are_partitioned_by_user() {
    let backend = MockBackend::start().await;
    let repository = HttpCartRepository::new(&backend.config()).unwrap();

    repository.save(&shopper(1), &lines(&[(7, 1)])).await.unwrap();
    repository.save(&shopper(2), &lines(&[(7, 1)])).await.unwrap();

    assert_eq!(backend.cart_writes().len(), 2);
    assert_eq!(repository.load(&shopper(1)).await.unwrap(), lines(&[(7, 1)]));
    assert!(repository.load(&shopper(3)).await.unwrap().is_empty());
}
