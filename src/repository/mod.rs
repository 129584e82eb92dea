// src/repository/mod.rs

//! Storage boundary: CRUD plus the scoped queries the cart core needs.
//!
//! Two implementations exist behind the same traits: Postgres (`postgres`)
//! for production, and an in-memory store (`memory`) used by the test suite
//! and by the server when no `DATABASE_URL` is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Cart, CartItem, Product, ProductInput};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PgCartRepository, PgProductRepository};

/// A single change to a cart's ledger, committed atomically together with
/// the recomputed total and the interaction timestamp.
#[derive(Debug, Clone, Copy)]
pub enum ItemMutation {
  Upsert { product_id: Uuid, quantity: i32 },
  Remove { product_id: Uuid },
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
  async fn create(&self, input: &ProductInput) -> Result<Product>;

  /// All products, ordered by name.
  async fn list(&self) -> Result<Vec<Product>>;

  async fn get(&self, id: Uuid) -> Result<Option<Product>>;

  async fn update(&self, id: Uuid, input: &ProductInput) -> Result<Option<Product>>;

  /// Deletes the product together with every cart entry referencing it, and
  /// refreshes the cached totals of the affected carts in the same
  /// transaction. Returns `false` if the product did not exist.
  async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
  /// Inserts a fresh empty cart bound to `session_token`. Fails with
  /// `AppError::Consistency` when another active cart already holds the
  /// token (the active-token uniqueness constraint).
  async fn create(&self, session_token: &str, now: DateTime<Utc>) -> Result<Cart>;

  async fn find_active_by_token(&self, session_token: &str) -> Result<Option<Cart>>;

  async fn get(&self, id: Uuid) -> Result<Option<Cart>>;

  /// The cart's ledger entries joined with their current catalog rows.
  async fn items_with_products(&self, cart_id: Uuid) -> Result<Vec<(CartItem, Product)>>;

  /// Commits one ledger mutation, the caller-computed total, and the
  /// interaction timestamp as a single atomic write. The store re-derives
  /// the total from its own facts inside the transaction and fails with
  /// `AppError::Consistency` (rolling everything back) if the two disagree.
  async fn commit_item_mutation(
    &self,
    cart_id: Uuid,
    mutation: ItemMutation,
    total_price_cents: i64,
    now: DateTime<Utc>,
  ) -> Result<Cart>;

  /// Mark phase query: every active cart whose last interaction is older
  /// than `idle_cutoff` gets `abandoned_at = now`. Returns the count marked.
  async fn mark_idle_as_abandoned(&self, idle_cutoff: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64>;

  /// Purge phase query: permanently deletes every cart abandoned before
  /// `retention_cutoff`, cascading to its items. Returns the count purged.
  async fn purge_abandoned_before(&self, retention_cutoff: DateTime<Utc>) -> Result<u64>;
}
