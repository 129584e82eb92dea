// src/lib.rs

//! Session-scoped shopping-cart backend.
//!
//! The core is the cart lifecycle and total-price consistency model: a
//! session token resolves to exactly one active cart, line-item mutations
//! follow replace-vs-increment merge semantics and atomically re-derive the
//! cart total, and a background sweeper walks carts through the
//! active → abandoned → purged state machine.

pub mod config;
pub mod errors;
pub mod models;
pub mod repository;
pub mod services;
pub mod state;
pub mod web;
