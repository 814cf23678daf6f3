//! Cart round trips, overlapping requests and checkout.

use std::time::Duration;

use cartwheel_client::{ClientError, Store};
use cartwheel_core::{Credentials, Price, ProductId, User, UserRole};
use cartwheel_integration_tests::{MockBackend, PASSWORD};
use secrecy::SecretString;

/// Backend with one $10 product and a signed-in shopper.
async fn signed_in() -> (MockBackend, Store, User, ProductId) {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::User);
    let product = backend.add_product("Pineapple", Price::from_cents(1000));
    let (store, _tokens) = backend.store();

    let credentials = Credentials::new("ada@example.com", SecretString::from(PASSWORD.to_owned()))
        .expect("valid credentials");
    let user = store.sign_in(&credentials).await.expect("sign in");
    (backend, store, user, product)
}

// ============================================================================
// Round Trips
// ============================================================================

#[tokio::test]
async fn test_add_then_fetch_yields_same_items() {
    let (backend, store, user, product) = signed_in().await;
    let mango = backend.add_product("Mango", Price::from_cents(350));

    store.add_item(&user.id, &product, 2).await.expect("add");
    let added = store.add_item(&user.id, &mango, 1).await.expect("add");
    let fetched = store.fetch_cart(&user.id).await.expect("fetch");

    assert_eq!(added.items, fetched.items);
    assert_eq!(store.cart().await.items, fetched.items);
    assert_eq!(fetched.item_count(), 3);
}

#[tokio::test]
async fn test_every_mutation_replaces_local_cart() {
    let (backend, store, user, product) = signed_in().await;

    store.add_item(&user.id, &product, 1).await.expect("add");
    store.increase_qty(&user.id, &product).await.expect("increase");
    store.increase_qty(&user.id, &product).await.expect("increase");
    let cart = store.decrease_qty(&user.id, &product).await.expect("decrease");
    assert_eq!(cart.line(&product).map(|l| l.quantity), Some(2));
    assert_eq!(store.cart().await, cart);

    let cart = store.remove_item(&user.id, &product).await.expect("remove");
    assert!(cart.is_empty());
    assert!(store.cart().await.is_empty());
    assert!(backend.cart_items(&user.id).is_empty());
}

#[tokio::test]
async fn test_empty_cart_leaves_no_items() {
    let (backend, store, user, product) = signed_in().await;
    let mango = backend.add_product("Mango", Price::from_cents(350));
    store.add_item(&user.id, &product, 1).await.expect("add");
    store.add_item(&user.id, &mango, 4).await.expect("add");

    let cart = store.empty_cart(&user.id).await.expect("empty");

    assert!(cart.items.is_empty());
    assert!(store.cart().await.items.is_empty());
    assert!(backend.cart_items(&user.id).is_empty());
}

#[tokio::test]
async fn test_displayed_total_after_increase() {
    let (_backend, store, user, product) = signed_in().await;

    store.add_item(&user.id, &product, 1).await.expect("add");
    store.increase_qty(&user.id, &product).await.expect("increase");

    let view = store.cart_view().await;
    assert_eq!(view.total.display(), "$20.00");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.item_count, 2);
}

#[tokio::test]
async fn test_failed_mutation_keeps_local_cart() {
    let (_backend, store, user, product) = signed_in().await;
    let before = store.add_item(&user.id, &product, 1).await.expect("add");

    let err = store
        .add_item(&user.id, &ProductId::new("missing"), 1)
        .await
        .expect_err("unknown product");
    assert!(matches!(
        err,
        ClientError::RequestFailed {
            status: 404,
            ..
        }
    ));
    assert_eq!(err.to_string(), "Failed to add item to cart (HTTP 404)");
    assert_eq!(store.cart().await, before);
}

#[tokio::test]
async fn test_fetch_cart_requires_token() {
    let backend = MockBackend::spawn().await;
    let user_id = backend.add_user("Ada", "ada@example.com", UserRole::User);
    let (store, _tokens) = backend.store();

    let err = store.fetch_cart(&user_id).await.expect_err("no token");
    assert!(matches!(err, ClientError::MissingToken));
    assert_eq!(backend.requests(), 0);
}

// ============================================================================
// Overlapping Requests
// ============================================================================

#[tokio::test]
async fn test_slow_increase_does_not_overwrite_later_decrease() {
    let (backend, store, user, product) = signed_in().await;
    store.add_item(&user.id, &product, 2).await.expect("add");
    backend.set_increase_delay(Duration::from_millis(200));

    // The increase is issued first and answers last
    let slow = store.increase_qty(&user.id, &product);
    let fast = async {
        backend.increase_received().await;
        store.decrease_qty(&user.id, &product).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    let slow = slow.expect("increase");
    let fast = fast.expect("decrease");
    assert_eq!(slow.line(&product).map(|l| l.quantity), Some(3));
    assert_eq!(fast.line(&product).map(|l| l.quantity), Some(2));

    // Local state follows the later-issued request, matching the server
    assert_eq!(store.cart().await, fast);
    assert_eq!(
        backend.cart_items(&user.id).first().map(|l| l.quantity),
        Some(2)
    );
}

#[tokio::test]
async fn test_sign_out_discards_cart_answer_in_flight() {
    let (backend, store, user, product) = signed_in().await;
    store.add_item(&user.id, &product, 1).await.expect("add");
    backend.set_increase_delay(Duration::from_millis(200));

    let slow = store.increase_qty(&user.id, &product);
    let sign_out = async {
        backend.increase_received().await;
        store.sign_out().await;
    };
    let (slow, ()) = tokio::join!(slow, sign_out);

    assert_eq!(
        slow.expect("increase").line(&product).map(|l| l.quantity),
        Some(2)
    );
    assert!(store.cart().await.is_empty());
    assert!(!store.is_authenticated().await);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_place_order_then_empty_leaves_cart_empty() {
    let (backend, store, user, product) = signed_in().await;
    store.add_item(&user.id, &product, 2).await.expect("add");

    store.place_order(&user.id).await.expect("place order");
    // Placing an order does not touch the cart
    assert_eq!(store.cart().await.item_count(), 2);

    store.empty_cart(&user.id).await.expect("empty");
    assert!(store.cart().await.is_empty());

    let orders = backend.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().and_then(|o| o.total_amount), Some(Price::from_cents(2000)));
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let (backend, store, user, product) = signed_in().await;
    store.add_item(&user.id, &product, 1).await.expect("add");

    let cart = store.checkout(&user.id).await.expect("checkout");

    assert!(cart.is_empty());
    assert!(store.cart().await.is_empty());
    assert_eq!(backend.orders().len(), 1);
    assert!(backend.cart_items(&user.id).is_empty());
}

#[tokio::test]
async fn test_checkout_with_empty_cart_places_nothing() {
    let (backend, store, user, _product) = signed_in().await;

    let err = store.checkout(&user.id).await.expect_err("empty cart");
    assert_eq!(err.status(), Some(400));
    assert!(backend.orders().is_empty());
}

#[tokio::test]
async fn test_place_order_requires_token() {
    let (backend, store, user, product) = signed_in().await;
    store.add_item(&user.id, &product, 1).await.expect("add");
    store.sign_out().await;
    let requests = backend.requests();

    let err = store.place_order(&user.id).await.expect_err("signed out");
    assert!(matches!(err, ClientError::MissingToken));
    assert_eq!(backend.requests(), requests);
}
