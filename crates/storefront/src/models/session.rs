//! Session-related types.
//!
//! Keys under which the cart identity is kept in the tower-sessions store.

/// Session keys for cart state.
pub mod keys {
    /// Key for the active cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the signed-in customer ID. Absent for anonymous shoppers.
    pub const CUSTOMER_ID: &str = "customer_id";
}
