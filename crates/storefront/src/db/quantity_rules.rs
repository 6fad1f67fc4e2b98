//! Per-product quantity rules from `storefront.product_quantity_rule`.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, query_as};

use cartkeeper_core::{ProductId, Quantity};

use crate::cart::{PersistenceError, QuantityRules, QuantityRulesSource};

const GET_QUANTITY_RULES_SQL: &str = include_str!("sql/get_quantity_rules.sql");

#[derive(Debug, FromRow)]
struct QuantityRuleRow {
    product_id: ProductId,
    min_sale_qty: Decimal,
    max_sale_qty: Option<Decimal>,
    qty_increments: Option<Decimal>,
    is_qty_decimal: bool,
}

impl TryFrom<QuantityRuleRow> for QuantityRules {
    type Error = PersistenceError;

    fn try_from(row: QuantityRuleRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: cartkeeper_core::QuantityError| {
            PersistenceError::DataCorruption(format!(
                "quantity rule for product {}: {field}: {e}",
                row.product_id
            ))
        };

        Ok(Self {
            min_sale_qty: Quantity::new(row.min_sale_qty).map_err(|e| corrupt("min_sale_qty", e))?,
            max_sale_qty: row
                .max_sale_qty
                .map(Quantity::new)
                .transpose()
                .map_err(|e| corrupt("max_sale_qty", e))?,
            qty_increments: row
                .qty_increments
                .map(Quantity::new)
                .transpose()
                .map_err(|e| corrupt("qty_increments", e))?,
            is_qty_decimal: row.is_qty_decimal,
        })
    }
}

/// Quantity rules loaded from `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgQuantityRules {
    pool: PgPool,
}

impl PgQuantityRules {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuantityRulesSource for PgQuantityRules {
    async fn rules_for(
        &self,
        products: &[ProductId],
    ) -> Result<HashMap<ProductId, QuantityRules>, PersistenceError> {
        let ids: Vec<i32> = products.iter().map(ProductId::as_i32).collect();

        let rows = query_as::<Postgres, QuantityRuleRow>(GET_QUANTITY_RULES_SQL)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let product_id = row.product_id;
                QuantityRules::try_from(row).map(|rules| (product_id, rules))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row() -> QuantityRuleRow {
        QuantityRuleRow {
            product_id: ProductId::new(5),
            min_sale_qty: Decimal::from(2),
            max_sale_qty: Some(Decimal::from(50)),
            qty_increments: None,
            is_qty_decimal: false,
        }
    }

    #[test]
    fn test_rule_row_converts() {
        let rules = QuantityRules::try_from(row()).unwrap();
        assert_eq!(rules.min_sale_qty.as_decimal(), Decimal::from(2));
        assert_eq!(rules.max_sale_qty.unwrap().as_decimal(), Decimal::from(50));
        assert!(rules.qty_increments.is_none());
    }

    #[test]
    fn test_rule_row_rejects_zero_increment() {
        let mut row = row();
        row.qty_increments = Some(Decimal::ZERO);

        let err = QuantityRules::try_from(row).unwrap_err();
        assert!(
            matches!(err, PersistenceError::DataCorruption(ref msg) if msg.contains("qty_increments"))
        );
    }
}
