// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::Level;
use uuid::Uuid;

use shopcart::models::{Cart, Product, ProductInput};
use shopcart::repository::{CartRepository, InMemoryStore, ProductRepository};
use shopcart::services::{CartService, SessionResolver};

/// Everything the service-level tests need, wired over the in-memory store.
pub struct TestApp {
  pub store: InMemoryStore,
  pub products: Arc<dyn ProductRepository>,
  pub carts: Arc<dyn CartRepository>,
  pub cart_service: CartService,
  pub session_resolver: SessionResolver,
}

pub fn test_app() -> TestApp {
  setup_tracing();
  let store = InMemoryStore::new();
  let products: Arc<dyn ProductRepository> = Arc::new(store.clone());
  let carts: Arc<dyn CartRepository> = Arc::new(store.clone());
  let cart_service = CartService::new(products.clone(), carts.clone());
  let session_resolver = SessionResolver::new(carts.clone());
  TestApp {
    store,
    products,
    carts,
    cart_service,
    session_resolver,
  }
}

pub async fn seed_product(app: &TestApp, name: &str, price_cents: i64) -> Product {
  app
    .products
    .create(&ProductInput {
      name: name.to_string(),
      price_cents,
    })
    .await
    .expect("seeding a product should not fail")
}

pub async fn fresh_cart(app: &TestApp) -> Cart {
  app
    .session_resolver
    .resolve(None)
    .await
    .expect("resolving a new session should not fail")
    .cart
}

/// A cart at an arbitrary point of its lifecycle, for sweeper fixtures.
pub fn cart_at(last_interaction_at: DateTime<Utc>, abandoned_at: Option<DateTime<Utc>>) -> Cart {
  Cart {
    id: Uuid::new_v4(),
    session_token: Uuid::new_v4().to_string(),
    total_price_cents: 0,
    last_interaction_at,
    abandoned_at,
    created_at: last_interaction_at,
  }
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
  Utc::now() - Duration::hours(hours)
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
