//! Cart persistence seam.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;

use cartkeeper_core::CartId;

use super::errors::PersistenceError;
use super::models::{Cart, SessionContext};

/// Loads and saves cart aggregates.
///
/// `save` must be atomic: either the whole aggregate is written or nothing
/// is. Concurrent saves of the same cart are last-write-wins.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The session's active cart, or `None` when the session has none.
    async fn active_cart(&self, session: &SessionContext) -> Result<Option<Cart>, PersistenceError>;

    /// Persist the aggregate, replacing its stored state.
    async fn save(&self, cart: &Cart) -> Result<(), PersistenceError>;
}

/// Process-local cart store.
///
/// Carts vanish with the process, so this only backs tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<CartId, Cart>>,
}

impl InMemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cart directly.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Unavailable` if the store lock is poisoned.
    pub fn insert(&self, cart: Cart) -> Result<(), PersistenceError> {
        self.carts
            .write()
            .map_err(|_| poisoned())?
            .insert(cart.id, cart);
        Ok(())
    }

    /// Read a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Unavailable` if the store lock is poisoned.
    pub fn get(&self, id: CartId) -> Result<Option<Cart>, PersistenceError> {
        Ok(self.carts.read().map_err(|_| poisoned())?.get(&id).cloned())
    }
}

fn poisoned() -> PersistenceError {
    PersistenceError::Unavailable("in-memory cart store lock poisoned".to_owned())
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn active_cart(&self, session: &SessionContext) -> Result<Option<Cart>, PersistenceError> {
        match session.cart_id {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    async fn save(&self, cart: &Cart) -> Result<(), PersistenceError> {
        let mut carts = self.carts.write().map_err(|_| poisoned())?;

        let Some(stored) = carts.get_mut(&cart.id) else {
            return Err(PersistenceError::CartNotFound(cart.id));
        };

        let mut saved = cart.clone();
        saved.updated_at = Utc::now();
        *stored = saved;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartkeeper_core::{CartLineId, ProductId, Quantity};

    use super::*;

    #[tokio::test]
    async fn test_active_cart_requires_session_cart() {
        let store = InMemoryCartStore::new();
        store.insert(Cart::new(CartId::new(1), None)).unwrap();

        assert!(
            store
                .active_cart(&SessionContext::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .active_cart(&SessionContext::anonymous(CartId::new(1)))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .active_cart(&SessionContext::anonymous(CartId::new(2)))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_save_replaces_aggregate() {
        let store = InMemoryCartStore::new();
        let cart = Cart::new(CartId::new(1), None).with_line(
            CartLineId::new(1),
            ProductId::new(1),
            Quantity::ONE,
        );
        store.insert(cart.clone()).unwrap();

        let mut changed = cart.clone();
        changed.lines.clear();
        store.save(&changed).await.unwrap();

        let stored = store.get(CartId::new(1)).unwrap().unwrap();
        assert!(stored.lines.is_empty());
        assert!(stored.updated_at >= cart.updated_at);
    }

    #[tokio::test]
    async fn test_save_unknown_cart_fails() {
        let store = InMemoryCartStore::new();
        let result = store.save(&Cart::new(CartId::new(9), None)).await;
        assert!(matches!(result, Err(PersistenceError::CartNotFound(id)) if id == CartId::new(9)));
    }
}
