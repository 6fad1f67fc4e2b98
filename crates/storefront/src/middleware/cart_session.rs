//! Session extractor for the active cart.
//!
//! Reads the cart and customer IDs that tower-sessions holds for the caller
//! and hands them to handlers as a [`SessionContext`].

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use cartkeeper_core::{CartId, CustomerId};

use crate::cart::SessionContext;
use crate::models::session_keys;

/// Extractor yielding the caller's [`SessionContext`].
///
/// Never rejects. A request without a session, or with unreadable session
/// values, gets an empty context and therefore no active cart.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CartSession(session): CartSession) -> impl IntoResponse {
///     match session.cart_id {
///         Some(id) => format!("cart {id}"),
///         None => "no cart".to_string(),
///     }
/// }
/// ```
pub struct CartSession(pub SessionContext);

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(SessionContext::default()));
        };

        Ok(Self(read_context(session).await))
    }
}

async fn read_context(session: &Session) -> SessionContext {
    let cart_id = session
        .get::<CartId>(session_keys::CART_ID)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to read cart id from session"))
        .ok()
        .flatten();
    let customer_id = session
        .get::<CustomerId>(session_keys::CUSTOMER_ID)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to read customer id from session"))
        .ok()
        .flatten();

    SessionContext {
        cart_id,
        customer_id,
    }
}

/// Helper to make a cart the session's active cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_active_cart(
    session: &Session,
    cart_id: CartId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_ID, cart_id).await
}

/// Helper to associate the session with a signed-in customer.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer_id: CustomerId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CUSTOMER_ID, customer_id).await
}
