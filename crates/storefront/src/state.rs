//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cart::{CartManager, CartStore, CartUpdateService, StockRulesNormalizer};
use crate::config::StorefrontConfig;
use crate::db::{PgCartStore, PgQuantityRules};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    carts: Arc<dyn CartStore>,
    cart_service: Arc<dyn CartUpdateService>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let carts: Arc<dyn CartStore> = Arc::new(PgCartStore::new(pool.clone()));
        let normalizer = Arc::new(StockRulesNormalizer::new(
            Arc::new(PgQuantityRules::new(pool.clone())),
            config.cart.default_rules(),
        ));
        let cart_service = Arc::new(CartManager::new(Arc::clone(&carts), normalizer));

        Self::with_services(config, pool, carts, cart_service)
    }

    /// Create application state with explicit cart collaborators.
    #[must_use]
    pub fn with_services(
        config: StorefrontConfig,
        pool: PgPool,
        carts: Arc<dyn CartStore>,
        cart_service: Arc<dyn CartUpdateService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
                cart_service,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cart store used for reads.
    #[must_use]
    pub fn carts(&self) -> &dyn CartStore {
        self.inner.carts.as_ref()
    }

    /// Cart update service.
    #[must_use]
    pub fn cart_service(&self) -> &dyn CartUpdateService {
        self.inner.cart_service.as_ref()
    }
}
