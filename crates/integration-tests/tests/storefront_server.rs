//! HTTP checks against a running storefront.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The storefront server running (cargo run -p cartkeeper-storefront)
//!
//! Run with: cargo test -p cartkeeper-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use cartkeeper_integration_tests::storefront_base_url;

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .unwrap_or_else(|e| panic!("Failed to create HTTP client: {e}"))
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_upstream_request_id_is_echoed() {
    let resp = client()
        .get(format!("{}/health", storefront_base_url()))
        .header("x-request-id", "integration-test-1")
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("integration-test-1")
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_fresh_session_has_no_cart() {
    let client = client();
    let base_url = storefront_base_url();

    let cart: Value = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"))
        .json()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(cart["cart_id"], Value::Null);

    // Without an active cart the update succeeds and touches nothing.
    let resp = client
        .post(format!("{base_url}/cart/update"))
        .json(&json!({ "cart": { "1": { "qty": "2" } } }))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(resp.status(), StatusCode::OK);

    let summary: Value = resp.json().await.unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(summary["ignored"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_save_without_active_cart_is_rejected() {
    let resp = client()
        .post(format!("{}/cart/save", storefront_base_url()))
        .json(&json!({ "cart_id": 1, "items": [] }))
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap_or_else(|e| panic!("{e}"));
    assert!(body["message"].is_string());
}
