// src/repository/memory.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Cart, CartItem, Product, ProductInput};
use crate::repository::{CartRepository, ItemMutation, ProductRepository};

/// Process-local store backing both repositories.
///
/// Every mutation happens under a single write lock, which is the in-memory
/// equivalent of the per-cart transaction the Postgres implementation uses:
/// a concurrent reader observes the item write, the refreshed total, and the
/// touched timestamp together or not at all.
#[derive(Clone, Default)]
pub struct InMemoryStore {
  inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
  products: HashMap<Uuid, Product>,
  carts: HashMap<Uuid, Cart>,
  items: HashMap<Uuid, CartItem>,
}

impl StoreInner {
  fn derived_total(&self, cart_id: Uuid) -> i64 {
    self
      .items
      .values()
      .filter(|item| item.cart_id == cart_id)
      .filter_map(|item| {
        self
          .products
          .get(&item.product_id)
          .map(|product| item.line_total_cents(product.price_cents))
      })
      .sum()
  }

  fn find_item(&self, cart_id: Uuid, product_id: Uuid) -> Option<Uuid> {
    self
      .items
      .values()
      .find(|item| item.cart_id == cart_id && item.product_id == product_id)
      .map(|item| item.id)
  }
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seeds a cart verbatim, timestamps included. Exists so fixtures can set
  /// up carts at arbitrary points of the lifecycle.
  pub fn insert_cart(&self, cart: Cart) {
    self.inner.write().carts.insert(cart.id, cart);
  }

  pub fn cart_count(&self) -> usize {
    self.inner.read().carts.len()
  }

  pub fn item_count(&self, cart_id: Uuid) -> usize {
    self
      .inner
      .read()
      .items
      .values()
      .filter(|item| item.cart_id == cart_id)
      .count()
  }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
  async fn create(&self, input: &ProductInput) -> Result<Product> {
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: input.name.trim().to_string(),
      price_cents: input.price_cents,
      created_at: now,
      updated_at: now,
    };
    self.inner.write().products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn list(&self) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = self.inner.read().products.values().cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.inner.read().products.get(&id).cloned())
  }

  async fn update(&self, id: Uuid, input: &ProductInput) -> Result<Option<Product>> {
    let mut inner = self.inner.write();
    match inner.products.get_mut(&id) {
      Some(product) => {
        product.name = input.name.trim().to_string();
        product.price_cents = input.price_cents;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
      }
      None => Ok(None),
    }
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let mut inner = self.inner.write();
    if inner.products.remove(&id).is_none() {
      return Ok(false);
    }

    let orphaned: Vec<Uuid> = inner
      .items
      .values()
      .filter(|item| item.product_id == id)
      .map(|item| item.id)
      .collect();
    let mut affected_carts: Vec<Uuid> = Vec::new();
    for item_id in orphaned {
      if let Some(item) = inner.items.remove(&item_id) {
        affected_carts.push(item.cart_id);
      }
    }

    for cart_id in affected_carts {
      let total = inner.derived_total(cart_id);
      if let Some(cart) = inner.carts.get_mut(&cart_id) {
        cart.total_price_cents = total;
      }
    }

    Ok(true)
  }
}

#[async_trait]
impl CartRepository for InMemoryStore {
  async fn create(&self, session_token: &str, now: DateTime<Utc>) -> Result<Cart> {
    let mut inner = self.inner.write();

    // Same guarantee as the partial unique index in Postgres.
    let token_taken = inner
      .carts
      .values()
      .any(|cart| cart.session_token == session_token && cart.is_active());
    if token_taken {
      return Err(AppError::Consistency(format!(
        "an active cart already exists for session token {}",
        session_token
      )));
    }

    let cart = Cart {
      id: Uuid::new_v4(),
      session_token: session_token.to_string(),
      total_price_cents: 0,
      last_interaction_at: now,
      abandoned_at: None,
      created_at: now,
    };
    inner.carts.insert(cart.id, cart.clone());
    Ok(cart)
  }

  async fn find_active_by_token(&self, session_token: &str) -> Result<Option<Cart>> {
    Ok(
      self
        .inner
        .read()
        .carts
        .values()
        .find(|cart| cart.session_token == session_token && cart.is_active())
        .cloned(),
    )
  }

  async fn get(&self, id: Uuid) -> Result<Option<Cart>> {
    Ok(self.inner.read().carts.get(&id).cloned())
  }

  async fn items_with_products(&self, cart_id: Uuid) -> Result<Vec<(CartItem, Product)>> {
    let inner = self.inner.read();
    let mut entries: Vec<(CartItem, Product)> = Vec::new();
    for item in inner.items.values().filter(|item| item.cart_id == cart_id) {
      let product = inner.products.get(&item.product_id).ok_or_else(|| {
        AppError::Consistency(format!("cart item {} references missing product {}", item.id, item.product_id))
      })?;
      entries.push((item.clone(), product.clone()));
    }
    entries.sort_by_key(|(item, _)| item.created_at);
    Ok(entries)
  }

  async fn commit_item_mutation(
    &self,
    cart_id: Uuid,
    mutation: ItemMutation,
    total_price_cents: i64,
    now: DateTime<Utc>,
  ) -> Result<Cart> {
    let mut inner = self.inner.write();

    if !inner.carts.contains_key(&cart_id) {
      return Err(AppError::NotFound(format!("Cart {} not found", cart_id)));
    }

    // Remember enough to undo the item write if the total check fails.
    let rollback: Option<(Uuid, Option<CartItem>)>;

    match mutation {
      ItemMutation::Upsert { product_id, quantity } => match inner.find_item(cart_id, product_id) {
        Some(item_id) => {
          let item = inner.items.get_mut(&item_id).unwrap();
          let previous = item.clone();
          item.quantity = quantity;
          item.updated_at = now;
          rollback = Some((item_id, Some(previous)));
        }
        None => {
          let item = CartItem {
            id: Uuid::new_v4(),
            cart_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
          };
          rollback = Some((item.id, None));
          inner.items.insert(item.id, item);
        }
      },
      ItemMutation::Remove { product_id } => match inner.find_item(cart_id, product_id) {
        Some(item_id) => {
          let previous = inner.items.remove(&item_id);
          rollback = Some((item_id, previous));
        }
        None => rollback = None,
      },
    }

    let derived_total = inner.derived_total(cart_id);
    if derived_total != total_price_cents {
      if let Some((item_id, previous)) = rollback {
        match previous {
          Some(item) => {
            inner.items.insert(item_id, item);
          }
          None => {
            inner.items.remove(&item_id);
          }
        }
      }
      return Err(AppError::Consistency(format!(
        "cart {} total mismatch: computed {} but ledger sums to {}",
        cart_id, total_price_cents, derived_total
      )));
    }

    let cart = inner.carts.get_mut(&cart_id).unwrap();
    cart.total_price_cents = total_price_cents;
    cart.last_interaction_at = now;
    Ok(cart.clone())
  }

  async fn mark_idle_as_abandoned(&self, idle_cutoff: DateTime<Utc>, now: DateTime<Utc>) -> Result<u64> {
    let mut inner = self.inner.write();
    let mut marked = 0u64;
    for cart in inner.carts.values_mut() {
      if cart.is_active() && cart.last_interaction_at < idle_cutoff {
        cart.mark_abandoned(now);
        marked += 1;
      }
    }
    Ok(marked)
  }

  async fn purge_abandoned_before(&self, retention_cutoff: DateTime<Utc>) -> Result<u64> {
    let mut inner = self.inner.write();
    let doomed: Vec<Uuid> = inner
      .carts
      .values()
      .filter(|cart| matches!(cart.abandoned_at, Some(at) if at < retention_cutoff))
      .map(|cart| cart.id)
      .collect();

    for cart_id in &doomed {
      inner.carts.remove(cart_id);
      inner.items.retain(|_, item| item.cart_id != *cart_id);
    }
    Ok(doomed.len() as u64)
  }
}
