// src/state.rs

use std::sync::Arc;

use crate::config::AppConfig;
use crate::repository::{CartRepository, ProductRepository};
use crate::services::{CartService, SessionResolver};

#[derive(Clone)]
pub struct AppState {
  pub products: Arc<dyn ProductRepository>,
  pub carts: Arc<dyn CartRepository>,
  pub cart_service: CartService,
  pub session_resolver: SessionResolver,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(products: Arc<dyn ProductRepository>, carts: Arc<dyn CartRepository>, config: Arc<AppConfig>) -> Self {
    let cart_service = CartService::new(products.clone(), carts.clone());
    let session_resolver = SessionResolver::new(carts.clone());
    Self {
      products,
      carts,
      cart_service,
      session_resolver,
      config,
    }
  }
}
