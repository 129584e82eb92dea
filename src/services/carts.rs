// src/services/carts.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, CartSummary, Product};
use crate::repository::{CartRepository, ItemMutation, ProductRepository};

/// The cart aggregate. Owns every mutation of a cart's ledger: it validates
/// input, applies the quantity merge semantics, recomputes the total price as
/// an explicit step, and hands the storage layer one atomic commit per
/// operation.
#[derive(Clone)]
pub struct CartService {
  products: Arc<dyn ProductRepository>,
  carts: Arc<dyn CartRepository>,
}

impl CartService {
  pub fn new(products: Arc<dyn ProductRepository>, carts: Arc<dyn CartRepository>) -> Self {
    Self { products, carts }
  }

  /// Sets the quantity of `product_id` in the cart, creating the entry when
  /// absent and **replacing** the quantity when present. Calling this twice
  /// with quantities 1 and then 3 leaves the entry at 3.
  #[instrument(name = "cart_service::set_item", skip(self, cart), fields(cart_id = %cart.id))]
  pub async fn set_item(&self, cart: &Cart, product_id: Uuid, quantity: i32) -> Result<CartSummary> {
    let product = self.fetch_product(product_id).await?;
    validate_quantity(quantity)?;

    let entries = self.carts.items_with_products(cart.id).await?;
    let total = total_with_entry(&entries, &product, Some(quantity));

    let updated = self
      .carts
      .commit_item_mutation(
        cart.id,
        ItemMutation::Upsert { product_id, quantity },
        total,
        Utc::now(),
      )
      .await?;

    info!(product_id = %product_id, quantity, total_price_cents = total, "Cart item set");
    self.summary(&updated).await
  }

  /// Adds `delta` to the quantity of `product_id`, creating the entry at 0
  /// first when absent. Calling this twice with deltas 1 and then 3 leaves
  /// the entry at 4. Fails before commit when the resulting quantity would
  /// not be positive.
  #[instrument(name = "cart_service::add_item", skip(self, cart), fields(cart_id = %cart.id))]
  pub async fn add_item(&self, cart: &Cart, product_id: Uuid, delta: i32) -> Result<CartSummary> {
    let product = self.fetch_product(product_id).await?;

    let entries = self.carts.items_with_products(cart.id).await?;
    let current = entries
      .iter()
      .find(|(item, _)| item.product_id == product_id)
      .map(|(item, _)| item.quantity)
      .unwrap_or(0);
    let quantity = current + delta;
    validate_quantity(quantity)?;

    let total = total_with_entry(&entries, &product, Some(quantity));

    let updated = self
      .carts
      .commit_item_mutation(
        cart.id,
        ItemMutation::Upsert { product_id, quantity },
        total,
        Utc::now(),
      )
      .await?;

    info!(product_id = %product_id, delta, quantity, total_price_cents = total, "Cart item incremented");
    self.summary(&updated).await
  }

  /// Removes the entry for `product_id`. Surfaces `NotFound` when the cart
  /// holds no such entry, leaving the cart untouched.
  #[instrument(name = "cart_service::remove_item", skip(self, cart), fields(cart_id = %cart.id))]
  pub async fn remove_item(&self, cart: &Cart, product_id: Uuid) -> Result<CartSummary> {
    let entries = self.carts.items_with_products(cart.id).await?;
    let entry = entries.iter().find(|(item, _)| item.product_id == product_id);
    let Some((_, product)) = entry else {
      return Err(AppError::NotFound("Product not found in cart".to_string()));
    };

    let total = total_with_entry(&entries, product, None);

    let updated = self
      .carts
      .commit_item_mutation(cart.id, ItemMutation::Remove { product_id }, total, Utc::now())
      .await?;

    info!(product_id = %product_id, total_price_cents = total, "Cart item removed");
    self.summary(&updated).await
  }

  /// The cart read view. A pure read: does not touch the interaction
  /// timestamp.
  pub async fn summary(&self, cart: &Cart) -> Result<CartSummary> {
    let entries = self.carts.items_with_products(cart.id).await?;
    Ok(CartSummary::from_ledger(cart, &entries))
  }

  async fn fetch_product(&self, product_id: Uuid) -> Result<Product> {
    self
      .products
      .get(product_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found", product_id)))
  }
}

fn validate_quantity(quantity: i32) -> Result<()> {
  if quantity <= 0 {
    return Err(AppError::validation("Quantity must be greater than 0"));
  }
  Ok(())
}

/// Sum of line totals with this product's entry set to `new_quantity`
/// (`None` drops the entry). This is the explicit total recomputation step;
/// the storage layer re-derives the same sum inside the commit transaction
/// and rejects the write on mismatch.
fn total_with_entry(entries: &[(CartItem, Product)], product: &Product, new_quantity: Option<i32>) -> i64 {
  let others: i64 = entries
    .iter()
    .filter(|(item, _)| item.product_id != product.id)
    .map(|(item, entry_product)| item.line_total_cents(entry_product.price_cents))
    .sum();

  match new_quantity {
    Some(quantity) => others + product.price_cents * i64::from(quantity),
    None => others,
  }
}
