//! Cart route handlers.
//!
//! Cart IDs are stored in the session. Updates go through the
//! [`CartUpdateService`](crate::cart::CartUpdateService); a rejected update
//! answers `400` with the shopper-facing message.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use cartkeeper_core::{CartId, CartLineId, CustomerId};

use crate::cart::{
    CartLineItem, CartSnapshot, CartSnapshotLine, CartUpdateRequest, UpdateSummary, scalar_text,
};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::CartSession;
use crate::state::AppState;

/// Cart display data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: Option<CartId>,
    pub customer_id: Option<CustomerId>,
    pub lines: Vec<CartLineItem>,
    pub total_quantity: Decimal,
}

/// Body of `POST /cart/update`.
///
/// `cart` maps line IDs to `{"qty": ..}`, `{"remove": true}` or a bare
/// quantity. Entries that cannot be read are skipped.
#[derive(Debug, Deserialize)]
pub struct UpdateCartPayload {
    #[serde(default)]
    pub cart: Map<String, Value>,
}

/// Body of `POST /cart/save`.
#[derive(Debug, Deserialize)]
pub struct SaveCartPayload {
    pub cart_id: CartId,
    #[serde(default)]
    pub items: Vec<SaveCartItem>,
}

/// One line of a [`SaveCartPayload`].
///
/// Both fields are read leniently; an item whose ID or quantity is not a
/// string or number is skipped.
#[derive(Debug, Deserialize)]
pub struct SaveCartItem {
    #[serde(default)]
    pub item_id: Value,
    #[serde(default)]
    pub qty: Value,
}

/// Response of `POST /cart/save`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveCartResponse {
    pub saved: bool,
    #[serde(flatten)]
    pub summary: UpdateSummary,
}

impl From<SaveCartPayload> for CartSnapshot {
    fn from(payload: SaveCartPayload) -> Self {
        let mut snapshot = Self {
            cart_id: payload.cart_id,
            lines: Vec::with_capacity(payload.items.len()),
            skipped: 0,
        };

        for item in payload.items {
            let line_id = scalar_text(&item.item_id).and_then(|id| id.parse::<CartLineId>().ok());
            match (line_id, scalar_text(&item.qty)) {
                (Some(line_id), Some(quantity)) => {
                    snapshot.lines.push(CartSnapshotLine { line_id, quantity });
                }
                _ => {
                    tracing::debug!(item_id = %item.item_id, "Skipping unreadable saved cart item");
                    snapshot.skipped += 1;
                }
            }
        }

        snapshot
    }
}

/// Show the session's active cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    CartSession(session): CartSession,
) -> Result<Json<CartView>> {
    let Some(cart) = state.carts().active_cart(&session).await? else {
        return Ok(Json(CartView::default()));
    };

    Ok(Json(CartView {
        cart_id: Some(cart.id),
        customer_id: cart.customer_id,
        total_quantity: cart.total_quantity(),
        lines: cart.lines,
    }))
}

/// Update line quantities on the active cart.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    CartSession(session): CartSession,
    Json(payload): Json<UpdateCartPayload>,
) -> Result<Json<UpdateSummary>> {
    let request = CartUpdateRequest::from_json(&payload.cart);
    add_breadcrumb("cart", "Updated cart quantities", None);

    let summary = state.cart_service().update_cart(session, request).await?;

    Ok(Json(summary))
}

/// Save a submitted copy of the cart.
#[instrument(skip_all)]
pub async fn save(
    State(state): State<AppState>,
    CartSession(session): CartSession,
    Json(payload): Json<SaveCartPayload>,
) -> Result<Json<SaveCartResponse>> {
    add_breadcrumb("cart", "Saved cart", None);

    let summary = state
        .cart_service()
        .save_cart(session, CartSnapshot::from(payload))
        .await?;

    Ok(Json(SaveCartResponse {
        saved: true,
        summary,
    }))
}
