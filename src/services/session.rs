// src/services/session.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::Cart;
use crate::repository::CartRepository;

/// The cart a session resolved to, together with the token the boundary must
/// hand back to the client.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
  pub cart: Cart,
  pub token: String,
}

/// Maps an opaque session token to exactly one active cart, creating an
/// empty one lazily the first time a session is seen.
#[derive(Clone)]
pub struct SessionResolver {
  carts: Arc<dyn CartRepository>,
}

impl SessionResolver {
  pub fn new(carts: Arc<dyn CartRepository>) -> Self {
    Self { carts }
  }

  /// Never returns an abandoned cart: a session whose cart was abandoned
  /// gets a fresh empty one under the same token.
  #[instrument(name = "session::resolve", skip(self, token))]
  pub async fn resolve(&self, token: Option<&str>) -> Result<ResolvedSession> {
    let token = match token {
      Some(t) if !t.is_empty() => t.to_string(),
      _ => Uuid::new_v4().to_string(),
    };

    if let Some(cart) = self.carts.find_active_by_token(&token).await? {
      return Ok(ResolvedSession { cart, token });
    }

    match self.carts.create(&token, Utc::now()).await {
      Ok(cart) => {
        info!(cart_id = %cart.id, "Created cart for new session");
        Ok(ResolvedSession { cart, token })
      }
      // Lost a concurrent first-request race for the same token; the winner's
      // cart is the session's cart.
      Err(AppError::Consistency(_)) => {
        let cart = self.carts.find_active_by_token(&token).await?.ok_or_else(|| {
          AppError::Consistency(format!("active cart for session token {} vanished during creation", token))
        })?;
        Ok(ResolvedSession { cart, token })
      }
      Err(e) => Err(e),
    }
  }
}
