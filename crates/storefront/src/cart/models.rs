//! Cart aggregate and update reports.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartkeeper_core::{CartId, CartLineId, CustomerId, ProductId, Quantity};

/// Identity carried by the caller's session.
///
/// The store resolves the active cart from `cart_id`; `customer_id` is the
/// authenticated customer, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub cart_id: Option<CartId>,
    pub customer_id: Option<CustomerId>,
}

impl SessionContext {
    /// Context for an anonymous shopper with an active cart.
    #[must_use]
    pub const fn anonymous(cart_id: CartId) -> Self {
        Self {
            cart_id: Some(cart_id),
            customer_id: None,
        }
    }

    /// Context for a signed-in customer with an active cart.
    #[must_use]
    pub const fn customer(cart_id: CartId, customer_id: CustomerId) -> Self {
        Self {
            cart_id: Some(cart_id),
            customer_id: Some(customer_id),
        }
    }
}

/// A line on a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// The cart aggregate.
///
/// Lines keep their insertion order. The store owns persistence; everything
/// else only reads the aggregate or changes it through reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub customer_id: Option<CustomerId>,
    pub lines: Vec<CartLineItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new(id: CartId, customer_id: Option<CustomerId>) -> Self {
        Self {
            id,
            customer_id,
            lines: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Builder-style helper to append a line.
    #[must_use]
    pub fn with_line(mut self, id: CartLineId, product_id: ProductId, quantity: Quantity) -> Self {
        self.lines.push(CartLineItem {
            id,
            product_id,
            quantity,
        });
        self
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, id: CartLineId) -> Option<&CartLineItem> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Look up a line by ID for mutation.
    pub fn line_mut(&mut self, id: CartLineId) -> Option<&mut CartLineItem> {
        self.lines.iter_mut().find(|line| line.id == id)
    }

    /// Remove a line, returning whether it existed.
    pub fn remove_line(&mut self, id: CartLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    /// Drop the customer association when the session has no customer but
    /// the cart still references one. Returns whether it was cleared.
    pub fn release_customer_for(&mut self, session: &SessionContext) -> bool {
        if session.customer_id.is_none() && self.customer_id.is_some() {
            self.customer_id = None;
            return true;
        }
        false
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> Decimal {
        self.lines.iter().map(|line| line.quantity.as_decimal()).sum()
    }
}

/// A submitted copy of a cart's quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart_id: CartId,
    pub lines: Vec<CartSnapshotLine>,
    /// Submitted lines that could not be read.
    #[serde(default)]
    pub skipped: usize,
}

/// One line of a [`CartSnapshot`].
///
/// The quantity is kept as submitted and normalized like any other update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshotLine {
    pub line_id: CartLineId,
    pub quantity: String,
}

/// A quantity that normalization changed from what was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityAdjustment {
    pub line_id: CartLineId,
    /// The raw requested value.
    pub requested: String,
    pub applied: Quantity,
}

/// What an update did to the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSummary {
    /// Lines whose quantity was set.
    pub updated: Vec<CartLineId>,
    /// Lines removed from the cart.
    pub removed: Vec<CartLineId>,
    /// Entries that referenced lines not on the cart.
    pub ignored: usize,
    /// Entries dropped as malformed before normalization.
    pub skipped: usize,
    /// Whether a stale customer association was dropped.
    pub customer_cleared: bool,
    pub adjustments: Vec<QuantityAdjustment>,
}

impl UpdateSummary {
    /// Whether the update changed anything that must be persisted.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty() && !self.customer_cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(CartId::new(1), Some(CustomerId::new(5)))
            .with_line(CartLineId::new(10), ProductId::new(100), Quantity::ONE)
            .with_line(CartLineId::new(11), ProductId::new(101), Quantity::ONE)
    }

    #[test]
    fn test_release_customer_for_anonymous_session() {
        let mut cart = cart();
        assert!(cart.release_customer_for(&SessionContext::anonymous(cart.id)));
        assert_eq!(cart.customer_id, None);

        // Second call is a no-op
        assert!(!cart.release_customer_for(&SessionContext::anonymous(cart.id)));
    }

    #[test]
    fn test_release_customer_keeps_authenticated_owner() {
        let mut cart = cart();
        let session = SessionContext::customer(cart.id, CustomerId::new(5));
        assert!(!cart.release_customer_for(&session));
        assert_eq!(cart.customer_id, Some(CustomerId::new(5)));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = cart();
        assert!(cart.remove_line(CartLineId::new(10)));
        assert!(!cart.remove_line(CartLineId::new(10)));
        assert_eq!(cart.lines.len(), 1);
        assert!(cart.line(CartLineId::new(11)).is_some());
    }

    #[test]
    fn test_total_quantity() {
        assert_eq!(cart().total_quantity(), Decimal::from(2));
    }

    #[test]
    fn test_summary_noop() {
        let mut summary = UpdateSummary {
            ignored: 3,
            skipped: 1,
            ..UpdateSummary::default()
        };
        assert!(summary.is_noop());

        summary.customer_cleared = true;
        assert!(!summary.is_noop());
    }
}
