//! Apply normalized quantities onto the cart's real lines.

use cartkeeper_core::{CartLineId, parse_decimal};

use super::models::{Cart, QuantityAdjustment};
use super::normalizer::{LineInstruction, NormalizedUpdates};

/// What reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub updated: Vec<CartLineId>,
    pub removed: Vec<CartLineId>,
    /// Updates naming lines the cart does not have.
    pub missing: usize,
    pub adjustments: Vec<QuantityAdjustment>,
}

/// Apply `updates` to `cart`.
///
/// The cart decides which lines exist: updates for unknown lines are counted
/// and otherwise ignored. A line whose quantity already matches is left alone
/// and does not count as updated.
pub fn reconcile(cart: &mut Cart, updates: &NormalizedUpdates) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    for update in &updates.lines {
        match update.instruction {
            LineInstruction::Remove => {
                if cart.remove_line(update.line_id) {
                    outcome.removed.push(update.line_id);
                } else {
                    outcome.missing += 1;
                }
            }
            LineInstruction::SetQuantity(quantity) => {
                let Some(line) = cart.line_mut(update.line_id) else {
                    outcome.missing += 1;
                    continue;
                };

                if let Some(requested) = &update.requested
                    && parse_decimal(requested).ok() != Some(quantity.as_decimal())
                {
                    tracing::info!(
                        line_id = %update.line_id,
                        requested = %requested,
                        applied = %quantity,
                        "Quantity was recalculated"
                    );
                    outcome.adjustments.push(QuantityAdjustment {
                        line_id: update.line_id,
                        requested: requested.clone(),
                        applied: quantity,
                    });
                }

                if line.quantity != quantity {
                    line.quantity = quantity;
                    outcome.updated.push(update.line_id);
                }
            }
        }
    }

    outcome
}
