//! Session-facing models for the storefront.
//!
//! The cart aggregate itself lives in [`crate::cart::models`].

pub mod session;

pub use session::keys as session_keys;
