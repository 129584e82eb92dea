// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {}", .0.join(", "))]
  Validation(Vec<String>),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// A derived value (cart total, active-token uniqueness) disagreed with the
  /// stored facts at commit time. The offending transaction is rolled back.
  #[error("Consistency Error: {0}")]
  Consistency(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Single-message validation failure.
  pub fn validation(message: impl Into<String>) -> Self {
    AppError::Validation(vec![message.into()])
  }
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in code that uses `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    if err.is::<sqlx::Error>() {
      return AppError::Sqlx(err.downcast::<sqlx::Error>().unwrap());
    }
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(messages) => HttpResponse::UnprocessableEntity().json(json!({"errors": messages})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Consistency(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Cart state conflict", "detail": m}))
      }
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"})),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
