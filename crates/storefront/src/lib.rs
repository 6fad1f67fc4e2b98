//! Cartkeeper storefront library.
//!
//! Cart update service, its `PostgreSQL` collaborators and the axum routes
//! that expose them. The binary in `main.rs` wires these together; keeping
//! them in a library lets the integration tests drive them directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
