// src/models/mod.rs

//! Contains data structures representing database entities.

// Declare child modules for each model
pub mod cart;
pub mod cart_item;
pub mod product;

// Re-export the model structs for convenient access
pub use cart::{Cart, CartLine, CartSummary};
pub use cart_item::CartItem;
pub use product::{Product, ProductInput};
