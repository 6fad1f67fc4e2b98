//! Cart update service.
//!
//! Loads the session's active cart, drops a stale customer binding, runs the
//! requested quantities through the normalizer, reconciles them onto the
//! cart's lines and saves the aggregate. Nothing is written unless every step
//! succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::instrument;

use cartkeeper_core::CartId;

use super::errors::{
    GENERIC_UPDATE_FAILURE, NormalizeError, PersistenceError, UpdateError, ValidationError,
};
use super::models::{CartSnapshot, SessionContext, UpdateSummary};
use super::normalizer::QuantityNormalizer;
use super::reconcile::reconcile;
use super::request::CartUpdateRequest;
use super::store::CartStore;

/// Updates cart line quantities on behalf of a session.
#[automock]
#[async_trait]
pub trait CartUpdateService: Send + Sync {
    /// Apply requested line quantities to the session's active cart.
    ///
    /// An empty request succeeds without writing anything.
    async fn update_cart(
        &self,
        session: SessionContext,
        updates: CartUpdateRequest,
    ) -> Result<UpdateSummary, UpdateError>;

    /// Apply a submitted cart snapshot's quantities to the active cart.
    ///
    /// Fails if the snapshot is for a different cart than the session's.
    async fn save_cart(
        &self,
        session: SessionContext,
        snapshot: CartSnapshot,
    ) -> Result<UpdateSummary, UpdateError>;
}

/// Internal failure classification, translated at the service boundary.
#[derive(Debug)]
enum UpdateFailure {
    Validation(ValidationError),
    Unexpected(PersistenceError),
}

impl From<ValidationError> for UpdateFailure {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<PersistenceError> for UpdateFailure {
    fn from(err: PersistenceError) -> Self {
        Self::Unexpected(err)
    }
}

impl From<NormalizeError> for UpdateFailure {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Validation(e) => Self::Validation(e),
            NormalizeError::Persistence(e) => Self::Unexpected(e),
        }
    }
}

/// [`CartUpdateService`] backed by a [`CartStore`] and a [`QuantityNormalizer`].
#[derive(Clone)]
pub struct CartManager {
    store: Arc<dyn CartStore>,
    normalizer: Arc<dyn QuantityNormalizer>,
}

impl CartManager {
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, normalizer: Arc<dyn QuantityNormalizer>) -> Self {
        Self { store, normalizer }
    }

    async fn apply(
        &self,
        session: SessionContext,
        updates: &CartUpdateRequest,
        expected_cart: Option<CartId>,
    ) -> Result<UpdateSummary, UpdateFailure> {
        let Some(mut cart) = self.store.active_cart(&session).await? else {
            if let Some(submitted) = expected_cart {
                return Err(ValidationError::CartMismatch {
                    submitted,
                    active: None,
                }
                .into());
            }
            tracing::debug!("No active cart for session, nothing to update");
            return Ok(UpdateSummary {
                ignored: updates.len(),
                skipped: updates.skipped(),
                ..UpdateSummary::default()
            });
        };

        if let Some(submitted) = expected_cart
            && submitted != cart.id
        {
            return Err(ValidationError::CartMismatch {
                submitted,
                active: Some(cart.id),
            }
            .into());
        }

        let customer_cleared = cart.release_customer_for(&session);
        if customer_cleared {
            tracing::info!(cart_id = %cart.id, "Cleared stale customer from anonymous cart");
        }

        let normalized = self.normalizer.process(&cart, updates).await?;
        let unknown_dropped = updates
            .lines()
            .iter()
            .filter(|update| cart.line(update.line_id).is_none())
            .filter(|update| !normalized.lines.iter().any(|l| l.line_id == update.line_id))
            .count();
        let outcome = reconcile(&mut cart, &normalized);

        let summary = UpdateSummary {
            updated: outcome.updated,
            removed: outcome.removed,
            ignored: unknown_dropped + outcome.missing,
            skipped: updates.skipped(),
            customer_cleared,
            adjustments: outcome.adjustments,
        };

        if summary.is_noop() {
            tracing::debug!(cart_id = %cart.id, "Cart unchanged, skipping save");
            return Ok(summary);
        }

        self.store.save(&cart).await?;

        tracing::info!(
            cart_id = %cart.id,
            updated = summary.updated.len(),
            removed = summary.removed.len(),
            ignored = summary.ignored,
            "Cart updated"
        );

        Ok(summary)
    }
}

/// Log a failure and turn it into the caller-facing error.
fn into_update_error(session: &SessionContext, failure: UpdateFailure) -> UpdateError {
    match failure {
        UpdateFailure::Validation(err) => {
            tracing::error!(
                severity = "critical",
                cart_id = ?session.cart_id,
                error = %err,
                "Update shopping cart failed"
            );
            UpdateError::CouldNotPersist(err.to_string())
        }
        UpdateFailure::Unexpected(err) => {
            let event_id = sentry::capture_error(&err);
            tracing::error!(
                severity = "critical",
                cart_id = ?session.cart_id,
                error = ?err,
                sentry_event_id = %event_id,
                "Update shopping cart failed unexpectedly"
            );
            UpdateError::CouldNotPersist(GENERIC_UPDATE_FAILURE.to_owned())
        }
    }
}

#[async_trait]
impl CartUpdateService for CartManager {
    #[instrument(skip_all, fields(cart_id = ?session.cart_id, lines = updates.len()))]
    async fn update_cart(
        &self,
        session: SessionContext,
        updates: CartUpdateRequest,
    ) -> Result<UpdateSummary, UpdateError> {
        self.apply(session, &updates, None)
            .await
            .map_err(|failure| into_update_error(&session, failure))
    }

    #[instrument(skip_all, fields(cart_id = ?session.cart_id, snapshot_cart_id = %snapshot.cart_id))]
    async fn save_cart(
        &self,
        session: SessionContext,
        snapshot: CartSnapshot,
    ) -> Result<UpdateSummary, UpdateError> {
        let updates = CartUpdateRequest::from_snapshot(&snapshot);
        self.apply(session, &updates, Some(snapshot.cart_id))
            .await
            .map_err(|failure| into_update_error(&session, failure))
    }
}
