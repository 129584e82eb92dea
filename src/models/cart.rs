// src/models/cart.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{CartItem, Product};

/// A session's shopping cart.
///
/// `abandoned_at` doubles as the state flag: `None` means the cart is active,
/// `Some` means the sweeper has abandoned it and it is waiting to be purged.
/// `total_price_cents` is a cache of the sum of all line totals; it is
/// re-derived and persisted together with every item mutation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cart {
  pub id: Uuid,
  pub session_token: String,
  pub total_price_cents: i64,
  pub last_interaction_at: DateTime<Utc>,
  pub abandoned_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl Cart {
  pub fn is_abandoned(&self) -> bool {
    self.abandoned_at.is_some()
  }

  pub fn is_active(&self) -> bool {
    self.abandoned_at.is_none()
  }

  /// Idempotent: a cart that is already abandoned keeps its original
  /// abandonment time.
  pub fn mark_abandoned(&mut self, now: DateTime<Utc>) {
    if self.abandoned_at.is_none() {
      self.abandoned_at = Some(now);
    }
  }
}

/// One line of the cart read view.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
  pub id: Uuid, // product id
  pub name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub line_total_cents: i64,
}

/// The read view returned by every cart endpoint: current line items with
/// live-priced line totals, plus the cart's cached total.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
  pub id: Uuid,
  pub products: Vec<CartLine>,
  pub total_price_cents: i64,
}

impl CartSummary {
  pub fn from_ledger(cart: &Cart, entries: &[(CartItem, Product)]) -> Self {
    let products = entries
      .iter()
      .map(|(item, product)| CartLine {
        id: product.id,
        name: product.name.clone(),
        quantity: item.quantity,
        unit_price_cents: product.price_cents,
        line_total_cents: item.line_total_cents(product.price_cents),
      })
      .collect();

    CartSummary {
      id: cart.id,
      products,
      total_price_cents: cart.total_price_cents,
    }
  }
}
