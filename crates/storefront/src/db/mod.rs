//! Database operations for storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `storefront.cart` - Cart header (owner, active flag)
//! - `storefront.cart_line` - Cart lines with `NUMERIC` quantities
//! - `storefront.product_quantity_rule` - Per-product sale quantity rules
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cartkeeper-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod carts;
pub mod quantity_rules;

pub use carts::PgCartStore;
pub use quantity_rules::PgQuantityRules;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
