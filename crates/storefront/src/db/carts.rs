//! `PostgreSQL` cart store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, query, query_as};

use cartkeeper_core::{CartId, CartLineId, CustomerId, ProductId, Quantity};

use crate::cart::{Cart, CartLineItem, CartStore, PersistenceError, SessionContext};

const GET_ACTIVE_CART_SQL: &str = include_str!("sql/get_active_cart.sql");
const GET_CART_LINES_SQL: &str = include_str!("sql/get_cart_lines.sql");
const UPDATE_CART_SQL: &str = include_str!("sql/update_cart.sql");
const DELETE_STALE_CART_LINES_SQL: &str = include_str!("sql/delete_stale_cart_lines.sql");
const UPDATE_CART_LINE_SQL: &str = include_str!("sql/update_cart_line.sql");

#[derive(Debug, FromRow)]
struct CartRow {
    id: CartId,
    customer_id: Option<CustomerId>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CartLineRow {
    id: CartLineId,
    product_id: ProductId,
    quantity: Decimal,
}

impl TryFrom<CartLineRow> for CartLineItem {
    type Error = PersistenceError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            PersistenceError::DataCorruption(format!("cart line {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            quantity,
        })
    }
}

/// Cart store backed by the `storefront.cart` and `storefront.cart_line` tables.
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn active_cart(&self, session: &SessionContext) -> Result<Option<Cart>, PersistenceError> {
        let Some(cart_id) = session.cart_id else {
            return Ok(None);
        };

        let Some(cart) = query_as::<Postgres, CartRow>(GET_ACTIVE_CART_SQL)
            .bind(cart_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            tracing::debug!(%cart_id, "Session cart is missing or inactive");
            return Ok(None);
        };

        let lines = query_as::<Postgres, CartLineRow>(GET_CART_LINES_SQL)
            .bind(cart.id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CartLineItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Cart {
            id: cart.id,
            customer_id: cart.customer_id,
            lines,
            updated_at: cart.updated_at,
        }))
    }

    async fn save(&self, cart: &Cart) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;

        let updated = query(UPDATE_CART_SQL)
            .bind(cart.id)
            .bind(cart.customer_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            // Dropping the transaction rolls it back.
            return Err(PersistenceError::CartNotFound(cart.id));
        }

        let kept: Vec<i32> = cart.lines.iter().map(|line| line.id.as_i32()).collect();
        let removed = query(DELETE_STALE_CART_LINES_SQL)
            .bind(cart.id)
            .bind(&kept)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for line in &cart.lines {
            query(UPDATE_CART_LINE_SQL)
                .bind(cart.id)
                .bind(line.id)
                .bind(line.quantity.as_decimal())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            cart_id = %cart.id,
            lines = cart.lines.len(),
            removed,
            "Cart saved"
        );

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_row_rejects_non_positive_quantity() {
        let row = CartLineRow {
            id: CartLineId::new(3),
            product_id: ProductId::new(1),
            quantity: Decimal::ZERO,
        };

        let err = CartLineItem::try_from(row).unwrap_err();
        assert!(matches!(err, PersistenceError::DataCorruption(ref msg) if msg.starts_with("cart line 3")));
    }

    #[test]
    fn test_line_row_converts() {
        let row = CartLineRow {
            id: CartLineId::new(3),
            product_id: ProductId::new(1),
            quantity: Decimal::new(25, 1),
        };

        let line = CartLineItem::try_from(row).unwrap();
        assert_eq!(line.quantity.as_decimal(), Decimal::new(25, 1));
    }
}
