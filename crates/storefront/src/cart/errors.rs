//! Cart domain errors.
//!
//! Collaborators fail with [`ValidationError`] (the request was understood
//! and rejected) or [`PersistenceError`] (the cart could not be read or
//! written). The service boundary only ever returns [`UpdateError`].

use thiserror::Error;

use cartkeeper_core::{CartId, CartLineId, Quantity};

/// Caller-safe message for failures whose detail must not leave the service.
pub const GENERIC_UPDATE_FAILURE: &str =
    "A server error stopped your cart from being updated. Please try to update your cart again.";

/// A business-rule rejection of the requested update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Requested quantity is above the product's maximum sale quantity.
    #[error("The most you may purchase is {max}.")]
    ExceedsMaximum {
        /// Offending cart line.
        line_id: CartLineId,
        /// Maximum allowed quantity for the line's product.
        max: Quantity,
    },

    /// Requested quantity cannot be satisfied by the product's rules.
    #[error("The fewest you may purchase is {min}.")]
    BelowMinimum {
        /// Offending cart line.
        line_id: CartLineId,
        /// Minimum allowed quantity for the line's product.
        min: Quantity,
    },

    /// The submitted cart snapshot is not the session's active cart.
    #[error("The cart you submitted is no longer your active cart.")]
    CartMismatch {
        /// Cart ID carried by the snapshot.
        submitted: CartId,
        /// Cart ID resolved from the session, if any.
        active: Option<CartId>,
    },
}

/// A failure reading or writing cart state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The cart being saved no longer exists.
    #[error("cart {0} not found")]
    CartNotFound(CartId),

    /// The backing store cannot serve requests.
    #[error("cart store unavailable: {0}")]
    Unavailable(String),
}

/// Failure raised by a [`QuantityNormalizer`](super::QuantityNormalizer).
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The request was rejected by a quantity rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Quantity rules could not be loaded.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// The only error surfaced by [`CartUpdateService`](super::CartUpdateService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// The cart was left untouched. The message is safe to show the shopper.
    #[error("{0}")]
    CouldNotPersist(String),
}

impl UpdateError {
    /// Message carried by the error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::CouldNotPersist(message) => message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_validation_messages_are_shopper_facing() {
        let err = ValidationError::ExceedsMaximum {
            line_id: CartLineId::new(1),
            max: Quantity::new(Decimal::from(10)).unwrap(),
        };
        assert_eq!(err.to_string(), "The most you may purchase is 10.");
    }

    #[test]
    fn test_limits_print_without_storage_scale() {
        let err = ValidationError::ExceedsMaximum {
            line_id: CartLineId::new(1),
            max: Quantity::new(Decimal::new(500_000, 4)).unwrap(),
        };
        assert_eq!(err.to_string(), "The most you may purchase is 50.");

        let err = ValidationError::BelowMinimum {
            line_id: CartLineId::new(1),
            min: Quantity::new(Decimal::new(25_000, 4)).unwrap(),
        };
        assert_eq!(err.to_string(), "The fewest you may purchase is 2.5.");
    }

    #[test]
    fn test_normalize_error_is_transparent() {
        let err = NormalizeError::from(ValidationError::BelowMinimum {
            line_id: CartLineId::new(1),
            min: Quantity::new(Decimal::from(2)).unwrap(),
        });
        assert_eq!(err.to_string(), "The fewest you may purchase is 2.");
    }

    #[test]
    fn test_update_error_message() {
        let err = UpdateError::CouldNotPersist(GENERIC_UPDATE_FAILURE.to_owned());
        assert_eq!(err.message(), GENERIC_UPDATE_FAILURE);
        assert_eq!(err.to_string(), GENERIC_UPDATE_FAILURE);
    }
}
