// src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
  pub name: String,
  pub price_cents: i64,
}

impl ProductInput {
  /// Field validation for the catalog. Collects every failing field so the
  /// boundary can surface the full message list at once.
  pub fn validate(&self) -> Result<()> {
    let mut messages = Vec::new();
    if self.name.trim().is_empty() {
      messages.push("Name can't be blank".to_string());
    }
    if self.price_cents < 0 {
      messages.push("Price must be greater than or equal to 0".to_string());
    }
    if messages.is_empty() {
      Ok(())
    } else {
      Err(AppError::Validation(messages))
    }
  }
}
