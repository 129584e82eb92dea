// src/repository/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, Product, ProductInput};
use crate::repository::{CartRepository, ItemMutation, ProductRepository};

#[derive(Clone)]
pub struct PgProductRepository {
  pool: PgPool,
}

impl PgProductRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
  async fn create(&self, input: &ProductInput) -> Result<Product> {
    let product: Product = sqlx::query_as(
      "INSERT INTO products (id, name, price_cents) VALUES ($1, $2, $3) \
       RETURNING id, name, price_cents, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(input.name.trim())
    .bind(input.price_cents)
    .fetch_one(&self.pool)
    .await?;

    Ok(product)
  }

  async fn list(&self) -> Result<Vec<Product>> {
    let products: Vec<Product> =
      sqlx::query_as("SELECT id, name, price_cents, created_at, updated_at FROM products ORDER BY name ASC")
        .fetch_all(&self.pool)
        .await?;

    Ok(products)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Product>> {
    let product: Option<Product> =
      sqlx::query_as("SELECT id, name, price_cents, created_at, updated_at FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

    Ok(product)
  }

  async fn update(&self, id: Uuid, input: &ProductInput) -> Result<Option<Product>> {
    let product: Option<Product> = sqlx::query_as(
      "UPDATE products SET name = $2, price_cents = $3, updated_at = now() WHERE id = $1 \
       RETURNING id, name, price_cents, created_at, updated_at",
    )
    .bind(id)
    .bind(input.name.trim())
    .bind(input.price_cents)
    .fetch_optional(&self.pool)
    .await?;

    Ok(product)
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let mut tx = self.pool.begin().await?;

    // Carts whose totals must be refreshed once the cascade removes this
    // product's ledger entries.
    let affected_cart_ids: Vec<Uuid> = sqlx::query_scalar("SELECT DISTINCT cart_id FROM cart_items WHERE product_id = $1")
      .bind(id)
      .fetch_all(&mut *tx)
      .await?;

    let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?
      .rows_affected();

    if deleted == 0 {
      return Ok(false);
    }

    for cart_id in affected_cart_ids {
      sqlx::query(
        "UPDATE carts SET total_price_cents = COALESCE( \
           (SELECT SUM(p.price_cents * ci.quantity) \
            FROM cart_items ci JOIN products p ON p.id = ci.product_id \
            WHERE ci.cart_id = $1), 0) \
         WHERE id = $1",
      )
      .bind(cart_id)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    Ok(true)
  }
}

#[derive(Clone)]
pub struct PgCartRepository {
  pool: PgPool,
}

impl PgCartRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CartRepository for PgCartRepository {
  async fn create(&self, session_token: &str, now: DateTime<Utc>) -> Result<Cart> {
    let inserted: std::result::Result<Cart, sqlx::Error> = sqlx::query_as(
      "INSERT INTO carts (id, session_token, total_price_cents, last_interaction_at) \
       VALUES ($1, $2, 0, $3) \
       RETURNING id, session_token, total_price_cents, last_interaction_at, abandoned_at, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(session_token)
    .bind(now)
    .fetch_one(&self.pool)
    .await;

    match inserted {
      Ok(cart) => Ok(cart),
      // The partial unique index on (session_token) WHERE abandoned_at IS NULL
      // rejects a concurrent first-request for the same new session.
      Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(AppError::Consistency(format!(
        "an active cart already exists for session token {}",
        session_token
      ))),
      Err(e) => Err(e.into()),
    }
  }

  async fn find_active_by_token(&self, session_token: &str) -> Result<Option<Cart>> {
    let cart: Option<Cart> = sqlx::query_as(
      "SELECT id, session_token, total_price_cents, last_interaction_at, abandoned_at, created_at \
       FROM carts WHERE session_token = $1 AND abandoned_at IS NULL",
    )
    .bind(session_token)
    .fetch_optional(&self.pool)
    .await?;

    Ok(cart)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Cart>> {
    let cart: Option<Cart> = sqlx::query_as(
      "SELECT id, session_token, total_price_cents, last_interaction_at, abandoned_at, created_at \
       FROM carts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(cart)
  }

  async fn items_with_products(&self, cart_id: Uuid) -> Result<Vec<(CartItem, Product)>> {
    let items: Vec<CartItem> = sqlx::query_as(
      "SELECT id, cart_id, product_id, quantity, created_at, updated_at \
       FROM cart_items WHERE cart_id = $1 ORDER BY created_at ASC",
    )
    .bind(cart_id)
    .fetch_all(&self.pool)
    .await?;

    if items.is_empty() {
      return Ok(Vec::new());
    }

    let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    let products: Vec<Product> =
      sqlx::query_as("SELECT id, name, price_cents, created_at, updated_at FROM products WHERE id = ANY($1)")
        .bind(&product_ids)
        .fetch_all(&self.pool)
        .await?;

    let mut by_id: HashMap<Uuid, Product> = products.into_iter().map(|p| (p.id, p)).collect();

    items
      .into_iter()
      .map(|item| {
        let product = by_id.remove(&item.product_id).ok_or_else(|| {
          // The FK guarantees this; hitting it means the catalog row vanished
          // between the two reads.
          AppError::Consistency(format!("cart item {} references missing product {}", item.id, item.product_id))
        })?;
        Ok((item, product))
      })
      .collect()
  }

  async fn commit_item_mutation(
    &self,
    cart_id: Uuid,
    mutation: ItemMutation,
    total_price_cents: i64,
    now: DateTime<Utc>,
  ) -> Result<Cart> {
    let mut tx = self.pool.begin().await?;

    // Row lock serializes concurrent mutations of the same cart.
    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
      .bind(cart_id)
      .fetch_optional(&mut *tx)
      .await?;
    if locked.is_none() {
      return Err(AppError::NotFound(format!("Cart {} not found", cart_id)));
    }

    match mutation {
      ItemMutation::Upsert { product_id, quantity } => {
        sqlx::query(
          "INSERT INTO cart_items (id, cart_id, product_id, quantity) \
           VALUES ($1, $2, $3, $4) \
           ON CONFLICT (cart_id, product_id) DO UPDATE \
           SET quantity = EXCLUDED.quantity, updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;
      }
      ItemMutation::Remove { product_id } => {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
          .bind(cart_id)
          .bind(product_id)
          .execute(&mut *tx)
          .await?;
      }
    }

    let derived_total: i64 = sqlx::query_scalar(
      "SELECT COALESCE(SUM(p.price_cents * ci.quantity), 0)::BIGINT \
       FROM cart_items ci JOIN products p ON p.id = ci.product_id \
       WHERE ci.cart_id = $1",
    )
    .bind(cart_id)
    .fetch_one(&mut *tx)
    .await?;

    if derived_total != total_price_cents {
      // Dropping the transaction rolls the item write back.
      return Err(AppError::Consistency(format!(
        "cart {} total mismatch: computed {} but ledger sums to {}",
        cart_id, total_price_cents, derived_total
      )));
    }

    let cart: Cart = sqlx::query_as(
      "UPDATE carts SET total_price_cents = $2, last_interaction_at = $3 WHERE id = $1 \
       RETURNING id, session_token, total_price_cents, last_interaction_at, abandoned_at, created_at",
    )
    .bind(cart_id)
    .bind(total_price_cents)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(cart)
  }

  async fn mark_idle_as_abandoned(&self, idle_cutoff: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64> {
    let marked = sqlx::query("UPDATE carts SET abandoned_at = $2 WHERE abandoned_at IS NULL AND last_interaction_at < $1")
      .bind(idle_cutoff)
      .bind(now)
      .execute(&self.pool)
      .await?
      .rows_affected();

    Ok(marked)
  }

  async fn purge_abandoned_before(&self, retention_cutoff: DateTime<Utc>) -> Result<u64> {
    // Items go with the cart via ON DELETE CASCADE.
    let purged = sqlx::query("DELETE FROM carts WHERE abandoned_at IS NOT NULL AND abandoned_at < $1")
      .bind(retention_cutoff)
      .execute(&self.pool)
      .await?
      .rows_affected();

    Ok(purged)
  }
}
