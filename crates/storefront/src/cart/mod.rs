//! Shopping cart updates.
//!
//! [`CartUpdateService`] is the entry point. It depends on a [`CartStore`]
//! for loading and saving the aggregate and a [`QuantityNormalizer`] for
//! turning requested quantities into ones the product rules allow.

pub mod errors;
pub mod models;
pub mod normalizer;
pub mod reconcile;
pub mod request;
pub mod service;
pub mod store;

pub use errors::{
    GENERIC_UPDATE_FAILURE, NormalizeError, PersistenceError, UpdateError, ValidationError,
};
pub use models::{
    Cart, CartLineItem, CartSnapshot, CartSnapshotLine, QuantityAdjustment, SessionContext,
    UpdateSummary,
};
pub use normalizer::{
    QuantityNormalizer, QuantityRules, QuantityRulesSource, StaticQuantityRules,
    StockRulesNormalizer,
};
pub use request::{CartLineUpdate, CartUpdateRequest, RequestedQuantity, scalar_text};
pub use service::{CartManager, CartUpdateService};
pub use store::{CartStore, InMemoryCartStore};
