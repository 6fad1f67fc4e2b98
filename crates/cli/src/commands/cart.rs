//! Cart maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! # Set line 12 to 3 and remove line 14 on cart 7, as an anonymous shopper
//! cartkeeper-cli cart update --cart 7 --line 12=3 --line 14=0
//!
//! # Same, acting for customer 42 (keeps the cart's customer association)
//! cartkeeper-cli cart update --cart 7 --customer 42 --line 12=3
//! ```
//!
//! Updates go through the same service as the storefront, so quantity rules
//! apply and a rejected update leaves the cart untouched.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `CART_DEFAULT_MIN_SALE_QTY`, `CART_DEFAULT_MAX_SALE_QTY`, `CART_ALLOW_DECIMAL_QTY`

use std::sync::Arc;

use cartkeeper_core::{CartId, CustomerId};
use cartkeeper_storefront::cart::{
    CartManager, CartUpdateRequest, CartUpdateService, SessionContext, StockRulesNormalizer,
    UpdateError, UpdateSummary,
};
use cartkeeper_storefront::config::{CartConfig, ConfigError, get_database_url};
use cartkeeper_storefront::db::{PgCartStore, PgQuantityRules, create_pool};
use thiserror::Error;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No readable line updates given ({0} skipped). Use --line <id>=<qty>")]
    NoLines(usize),

    #[error("Cart update failed: {0}")]
    Update(#[from] UpdateError),
}

/// Apply `line=qty` updates to a cart.
///
/// # Errors
///
/// Returns `CartCommandError` if configuration or the connection fails, no
/// line could be parsed, or the service rejects the update.
pub async fn update(
    cart: i32,
    customer: Option<i32>,
    lines: &[String],
) -> Result<UpdateSummary, CartCommandError> {
    dotenvy::dotenv().ok();

    let request = CartUpdateRequest::from_pairs(lines.iter().map(String::as_str));
    if request.is_empty() {
        return Err(CartCommandError::NoLines(request.skipped()));
    }

    let defaults = CartConfig::from_env()?.default_rules();
    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to storefront database...");
    let pool = create_pool(&database_url).await?;

    let service = CartManager::new(
        Arc::new(PgCartStore::new(pool.clone())),
        Arc::new(StockRulesNormalizer::new(
            Arc::new(PgQuantityRules::new(pool)),
            defaults,
        )),
    );

    let session = SessionContext {
        cart_id: Some(CartId::new(cart)),
        customer_id: customer.map(CustomerId::new),
    };

    tracing::info!(cart, lines = request.len(), "Updating cart");
    let summary = service.update_cart(session, request).await?;

    Ok(summary)
}
