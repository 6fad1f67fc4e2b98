//! Quantity normalization.
//!
//! Turns raw requested quantities into ones a cart line can hold, using each
//! product's stock rules (minimum and maximum sale quantity, sale increments,
//! whether fractional quantities are allowed).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use cartkeeper_core::{CartLineId, ProductId, Quantity, parse_decimal};

use super::errors::{NormalizeError, PersistenceError, ValidationError};
use super::models::Cart;
use super::request::{CartUpdateRequest, RequestedQuantity};

/// Default maximum sale quantity for products without stored rules.
pub const DEFAULT_MAX_SALE_QTY: i64 = 10_000;

/// Stock rules that bound a product's cart quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRules {
    pub min_sale_qty: Quantity,
    pub max_sale_qty: Option<Quantity>,
    pub qty_increments: Option<Quantity>,
    pub is_qty_decimal: bool,
}

impl Default for QuantityRules {
    fn default() -> Self {
        Self {
            min_sale_qty: Quantity::ONE,
            max_sale_qty: Quantity::new(Decimal::from(DEFAULT_MAX_SALE_QTY)).ok(),
            qty_increments: None,
            is_qty_decimal: false,
        }
    }
}

impl QuantityRules {
    /// Suggest the quantity to store for a request.
    ///
    /// `requested` is `None` when the submitted value was not numeric; such
    /// requests, and zero or negative ones, fall back to the minimum.
    /// Fractional quantities keep at most [`Quantity::SCALE`] decimal places,
    /// and [`Quantity::MAX`] bounds every product, with or without a stored
    /// maximum.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ExceedsMaximum`] when the request is above
    /// the maximum sale quantity, and [`ValidationError::BelowMinimum`] when
    /// no increment multiple fits between the minimum and the maximum.
    pub fn suggest(
        &self,
        line_id: CartLineId,
        requested: Option<Decimal>,
    ) -> Result<Quantity, ValidationError> {
        let min = self.min_sale_qty;
        let max = self
            .max_sale_qty
            .map_or(Quantity::MAX, |max| max.min(Quantity::MAX));

        let mut qty = match requested {
            Some(value) if value > Decimal::ZERO => value,
            _ => min.as_decimal(),
        };

        let scale = if self.is_qty_decimal { Quantity::SCALE } else { 0 };
        qty = qty.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);

        if qty < min.as_decimal() {
            qty = min.as_decimal();
        }

        if qty > max.as_decimal() {
            return Err(ValidationError::ExceedsMaximum { line_id, max });
        }

        if let Some(step) = self.qty_increments.map(|q| q.as_decimal()) {
            let remainder = qty % step;
            if !remainder.is_zero() {
                qty = qty - remainder + step;
                if qty > max.as_decimal() {
                    qty -= step;
                }
            }
        }

        if qty < min.as_decimal() {
            return Err(ValidationError::BelowMinimum { line_id, min });
        }

        Quantity::new(qty).map_err(|_| ValidationError::BelowMinimum { line_id, min })
    }
}

/// Source of per-product quantity rules.
#[automock]
#[async_trait]
pub trait QuantityRulesSource: Send + Sync {
    /// Rules for the given products. Products without stored rules are
    /// absent from the result.
    async fn rules_for(
        &self,
        products: &[ProductId],
    ) -> Result<HashMap<ProductId, QuantityRules>, PersistenceError>;
}

/// Fixed, in-process quantity rules.
#[derive(Debug, Clone, Default)]
pub struct StaticQuantityRules {
    rules: HashMap<ProductId, QuantityRules>,
}

impl StaticQuantityRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rules for a product.
    #[must_use]
    pub fn with(mut self, product_id: ProductId, rules: QuantityRules) -> Self {
        self.rules.insert(product_id, rules);
        self
    }
}

#[async_trait]
impl QuantityRulesSource for StaticQuantityRules {
    async fn rules_for(
        &self,
        products: &[ProductId],
    ) -> Result<HashMap<ProductId, QuantityRules>, PersistenceError> {
        Ok(products
            .iter()
            .filter_map(|id| self.rules.get(id).map(|rules| (*id, *rules)))
            .collect())
    }
}

/// What reconciliation should do to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineInstruction {
    SetQuantity(Quantity),
    Remove,
}

/// A normalized line update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine {
    pub line_id: CartLineId,
    pub instruction: LineInstruction,
    /// The raw value before normalization, when one was submitted.
    pub requested: Option<String>,
}

/// Output of a [`QuantityNormalizer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedUpdates {
    pub lines: Vec<NormalizedLine>,
}

/// Repairs raw requested quantities before they reach the cart.
///
/// Implementations may drop entries but never add any. Only dropped entries
/// whose line is not on the cart are reported back to the caller as ignored.
#[automock]
#[async_trait]
pub trait QuantityNormalizer: Send + Sync {
    /// Normalize `request` against the lines of `cart`.
    async fn process(
        &self,
        cart: &Cart,
        request: &CartUpdateRequest,
    ) -> Result<NormalizedUpdates, NormalizeError>;
}

/// Normalizer enforcing per-product [`QuantityRules`].
///
/// Entries for lines that are not on the cart are dropped, since there is
/// no product to take rules from.
#[derive(Clone)]
pub struct StockRulesNormalizer {
    rules: Arc<dyn QuantityRulesSource>,
    defaults: QuantityRules,
}

impl StockRulesNormalizer {
    /// Create a normalizer. `defaults` apply to products without stored rules.
    #[must_use]
    pub fn new(rules: Arc<dyn QuantityRulesSource>, defaults: QuantityRules) -> Self {
        Self { rules, defaults }
    }
}

impl std::fmt::Debug for StockRulesNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockRulesNormalizer")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QuantityNormalizer for StockRulesNormalizer {
    async fn process(
        &self,
        cart: &Cart,
        request: &CartUpdateRequest,
    ) -> Result<NormalizedUpdates, NormalizeError> {
        let mut products: Vec<ProductId> = request
            .lines()
            .iter()
            .filter_map(|update| cart.line(update.line_id))
            .map(|line| line.product_id)
            .collect();
        products.sort_unstable();
        products.dedup();

        let rules = if products.is_empty() {
            HashMap::new()
        } else {
            self.rules.rules_for(&products).await?
        };

        let mut normalized = NormalizedUpdates::default();

        for update in request.lines() {
            let Some(line) = cart.line(update.line_id) else {
                continue;
            };
            let rules = rules.get(&line.product_id).unwrap_or(&self.defaults);

            let normalized_line = match &update.requested {
                RequestedQuantity::Remove => NormalizedLine {
                    line_id: update.line_id,
                    instruction: LineInstruction::Remove,
                    requested: None,
                },
                RequestedQuantity::Raw(raw) => {
                    let parsed = parse_decimal(raw).ok();
                    let instruction = if parsed == Some(Decimal::ZERO) {
                        LineInstruction::Remove
                    } else {
                        LineInstruction::SetQuantity(rules.suggest(update.line_id, parsed)?)
                    };
                    NormalizedLine {
                        line_id: update.line_id,
                        instruction,
                        requested: Some(raw.clone()),
                    }
                }
            };

            normalized.lines.push(normalized_line);
        }

        Ok(normalized)
    }
}
