// src/models/cart_item.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One product's quantity within one cart. At most one row exists per
/// (cart, product) pair; quantity changes update the row in place.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl CartItem {
  /// Line total at the current catalog price. Never stored; the cart's
  /// cached total is re-derived from these on every mutation.
  pub fn line_total_cents(&self, unit_price_cents: i64) -> i64 {
    unit_price_cents * i64::from(self.quantity)
  }
}
