//! End-to-end cart update tests over the HTTP routes.
//!
//! These run in-process against the in-memory cart store and in-memory
//! sessions, so they need no external services.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use cartkeeper_core::{CartId, CartLineId, CustomerId, ProductId, Quantity};
use cartkeeper_integration_tests::{app_with_session, lazy_pool, test_config};
use cartkeeper_storefront::cart::{
    Cart, CartStore, GENERIC_UPDATE_FAILURE, InMemoryCartStore, QuantityRules,
    QuantityRulesSource, SessionContext, StaticQuantityRules,
};
use cartkeeper_storefront::middleware::request_id::REQUEST_ID_HEADER;
use cartkeeper_storefront::routes;
use cartkeeper_storefront::state::AppState;

const CART: CartId = CartId::new(100);
const CUSTOMER: CustomerId = CustomerId::new(7);

fn qty(value: i64) -> Quantity {
    Quantity::new(Decimal::from(value)).unwrap_or_else(|e| panic!("{e}"))
}

/// Cart with three lines: 1 x product 10, 2 x product 20, 5 x product 30.
fn seeded_store(customer: Option<CustomerId>) -> Arc<InMemoryCartStore> {
    let store = Arc::new(InMemoryCartStore::new());
    store
        .insert(
            Cart::new(CART, customer)
                .with_line(CartLineId::new(1), ProductId::new(10), qty(1))
                .with_line(CartLineId::new(2), ProductId::new(20), qty(2))
                .with_line(CartLineId::new(3), ProductId::new(30), qty(5)),
        )
        .unwrap_or_else(|e| panic!("{e}"));
    store
}

fn stored_cart(store: &InMemoryCartStore) -> Cart {
    store
        .get(CART)
        .unwrap_or_else(|e| panic!("{e}"))
        .unwrap_or_else(|| panic!("cart {CART} missing"))
}

fn app(store: &Arc<InMemoryCartStore>, rules: StaticQuantityRules, context: SessionContext) -> Router {
    let store: Arc<dyn CartStore> = store.clone();
    let rules: Arc<dyn QuantityRulesSource> = Arc::new(rules);
    app_with_session(store, rules, context)
}

async fn post(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap_or_else(|e| panic!("{e}")),
        )
        .await
        .unwrap_or_else(|e| match e {});

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_repairs_invalid_quantities() {
    let store = seeded_store(None);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/update",
        &json!({ "cart": { "1": { "qty": "-5" }, "2": { "qty": "abc" }, "3": { "qty": "2,5" } } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adjustments"].as_array().map(Vec::len), Some(3));

    let cart = stored_cart(&store);
    assert_eq!(cart.line(CartLineId::new(1)).map(|l| l.quantity), Some(qty(1)));
    assert_eq!(cart.line(CartLineId::new(2)).map(|l| l.quantity), Some(qty(1)));
    assert_eq!(cart.line(CartLineId::new(3)).map(|l| l.quantity), Some(qty(3)));
}

#[tokio::test]
async fn test_empty_update_changes_nothing() {
    let store = seeded_store(None);
    let before = stored_cart(&store);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/update",
        &json!({ "cart": {} }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], json!([]));
    assert_eq!(stored_cart(&store), before);
}

#[tokio::test]
async fn test_unknown_lines_are_ignored() {
    let store = seeded_store(None);
    let before = stored_cart(&store);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/update",
        &json!({ "cart": { "999": { "qty": "4" } } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ignored"], 1);
    assert_eq!(stored_cart(&store), before);
}

#[tokio::test]
async fn test_anonymous_update_clears_customer() {
    let store = seeded_store(Some(CUSTOMER));

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/update",
        &json!({ "cart": { "1": { "qty": "2" } } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_cleared"], true);
    assert_eq!(stored_cart(&store).customer_id, None);
}

#[tokio::test]
async fn test_signed_in_update_keeps_customer() {
    let store = seeded_store(Some(CUSTOMER));

    let (status, _) = post(
        app(
            &store,
            StaticQuantityRules::new(),
            SessionContext::customer(CART, CUSTOMER),
        ),
        "/cart/update",
        &json!({ "cart": { "1": { "qty": "2" } } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored_cart(&store).customer_id, Some(CUSTOMER));
}

#[tokio::test]
async fn test_rule_violation_rejects_whole_update() {
    let store = seeded_store(Some(CUSTOMER));
    let before = stored_cart(&store);
    let rules = StaticQuantityRules::new().with(
        ProductId::new(20),
        QuantityRules {
            max_sale_qty: Some(qty(4)),
            ..QuantityRules::default()
        },
    );

    let (status, body) = post(
        app(&store, rules, SessionContext::anonymous(CART)),
        "/cart/update",
        &json!({ "cart": { "1": { "qty": "3" }, "2": { "qty": "9" } } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "The most you may purchase is 4.");
    // Neither line 1 nor the customer release was written.
    assert_eq!(stored_cart(&store), before);
}

#[tokio::test]
async fn test_increment_rules_round_up() {
    let store = seeded_store(None);
    let rules = StaticQuantityRules::new().with(
        ProductId::new(30),
        QuantityRules {
            qty_increments: Some(qty(6)),
            ..QuantityRules::default()
        },
    );

    let (status, _) = post(
        app(&store, rules, SessionContext::anonymous(CART)),
        "/cart/update",
        &json!({ "cart": { "3": "7" } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stored_cart(&store).line(CartLineId::new(3)).map(|l| l.quantity),
        Some(qty(12))
    );
}

#[tokio::test]
async fn test_zero_and_remove_drop_lines() {
    let store = seeded_store(None);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/update",
        &json!({ "cart": { "1": { "qty": "0" }, "2": { "remove": true } } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], json!([1, 2]));

    let cart = stored_cart(&store);
    assert_eq!(cart.lines.len(), 1);
    assert!(cart.line(CartLineId::new(3)).is_some());
}

#[tokio::test]
async fn test_session_without_cart_writes_nothing() {
    let store = seeded_store(None);
    let before = stored_cart(&store);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::default()),
        "/cart/update",
        &json!({ "cart": { "1": { "qty": "4" } } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ignored"], 1);
    assert_eq!(stored_cart(&store), before);
}

#[tokio::test]
async fn test_save_snapshot_for_other_cart_is_rejected() {
    let store = seeded_store(None);
    let before = stored_cart(&store);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/save",
        &json!({ "cart_id": 555, "items": [{ "item_id": 1, "qty": 3 }] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(body["message"], GENERIC_UPDATE_FAILURE);
    assert_eq!(stored_cart(&store), before);
}

#[tokio::test]
async fn test_save_snapshot_updates_cart() {
    let store = seeded_store(None);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/save",
        &json!({ "cart_id": 100, "items": [{ "item_id": 2, "qty": 3 }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);
    assert_eq!(
        stored_cart(&store).line(CartLineId::new(2)).map(|l| l.quantity),
        Some(qty(3))
    );
}

#[tokio::test]
async fn test_save_snapshot_repairs_unreadable_quantities() {
    let store = seeded_store(None);

    let (status, body) = post(
        app(&store, StaticQuantityRules::new(), SessionContext::anonymous(CART)),
        "/cart/save",
        &json!({ "cart_id": 100, "items": [{ "item_id": 2, "qty": "abc" }, { "item_id": 3, "qty": null }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skipped"], 1);

    let cart = stored_cart(&store);
    assert_eq!(cart.line(CartLineId::new(2)).map(|l| l.quantity), Some(qty(1)));
    assert_eq!(cart.line(CartLineId::new(3)).map(|l| l.quantity), Some(qty(5)));
}

#[tokio::test]
async fn test_every_response_carries_request_id() {
    let state = AppState::with_services(
        test_config(),
        lazy_pool(),
        Arc::new(InMemoryCartStore::new()),
        Arc::new(cartkeeper_integration_tests::cart_manager(
            Arc::new(InMemoryCartStore::new()),
            Arc::new(StaticQuantityRules::new()),
        )),
    );
    let app = routes::app(
        state,
        tower_sessions::SessionManagerLayer::new(tower_sessions::MemoryStore::default()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap_or_else(|e| panic!("{e}")),
        )
        .await
        .unwrap_or_else(|e| match e {});

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}
