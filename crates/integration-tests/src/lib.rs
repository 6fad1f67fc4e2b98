//! Integration tests for Cartkeeper.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p cartkeeper-integration-tests
//!
//! # Database and live-server tests
//! STOREFRONT_DATABASE_URL=postgres://... cargo test -p cartkeeper-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_update` - Cart update service and HTTP routes, in-process
//! - `postgres_cart_store` - Cart store and quantity rules against `PostgreSQL`
//! - `storefront_server` - HTTP checks against a running storefront
//!
//! This crate only exposes helpers; the tests live in `tests/`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{Next, from_fn_with_state},
    response::Response,
};
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};

use cartkeeper_storefront::cart::{
    CartManager, CartStore, QuantityRules, QuantityRulesSource, SessionContext,
    StockRulesNormalizer,
};
use cartkeeper_storefront::config::{CartConfig, StorefrontConfig};
use cartkeeper_storefront::middleware::{set_active_cart, set_current_customer};
use cartkeeper_storefront::routes;
use cartkeeper_storefront::state::AppState;

/// Base URL for a running storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Configuration for in-process tests. Nothing in it is ever dialed.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/cartkeeper_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        cart: CartConfig::default(),
    }
}

/// A pool that only connects when first used.
///
/// # Panics
///
/// Panics if the hard-coded URL fails to parse.
#[must_use]
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/cartkeeper_test")
        .unwrap_or_else(|e| panic!("invalid test database url: {e}"))
}

/// Connect to the test database and apply the storefront migrations.
///
/// # Panics
///
/// Panics if `STOREFRONT_DATABASE_URL` is unset or the database is unreachable.
pub async fn migrated_pool() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| panic!("STOREFRONT_DATABASE_URL must be set for database tests"));

    let pool = PgPool::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to test database: {e}"));

    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .unwrap_or_else(|e| panic!("failed to run migrations: {e}"));

    pool
}

/// Build a cart update service over the given store and rules.
#[must_use]
pub fn cart_manager(
    store: Arc<dyn CartStore>,
    rules: Arc<dyn QuantityRulesSource>,
) -> CartManager {
    CartManager::new(
        store,
        Arc::new(StockRulesNormalizer::new(rules, QuantityRules::default())),
    )
}

async fn seed_session(
    State(context): State<SessionContext>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if let Some(cart_id) = context.cart_id {
        set_active_cart(&session, cart_id)
            .await
            .unwrap_or_else(|e| panic!("failed to seed cart id: {e}"));
    }
    if let Some(customer_id) = context.customer_id {
        set_current_customer(&session, customer_id)
            .await
            .unwrap_or_else(|e| panic!("failed to seed customer id: {e}"));
    }
    next.run(request).await
}

/// Storefront routes over in-memory sessions, with `context` already in the
/// session of every request.
#[must_use]
pub fn app_with_session(
    store: Arc<dyn CartStore>,
    rules: Arc<dyn QuantityRulesSource>,
    context: SessionContext,
) -> Router {
    let service = Arc::new(cart_manager(Arc::clone(&store), rules));
    let state = AppState::with_services(test_config(), lazy_pool(), store, service);

    routes::routes()
        .layer(from_fn_with_state(context, seed_session))
        .layer(SessionManagerLayer::new(MemoryStore::default()))
        .with_state(state)
}
