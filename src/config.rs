// src/config.rs

use crate::errors::{AppError, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  /// Postgres connection string. When absent the server falls back to the
  /// in-memory store, which is handy for demos and local development.
  pub database_url: Option<String>,

  /// How long an active cart may sit without interaction before the sweeper
  /// marks it abandoned.
  pub cart_idle_after: Duration,

  /// How long an abandoned cart is retained before the sweeper purges it.
  pub cart_purge_after: Duration,

  /// Cadence of the background sweep, in seconds.
  pub sweep_interval_secs: u64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = env::var("DATABASE_URL").ok();

    let cart_idle_hours = get_env("CART_IDLE_HOURS")
      .unwrap_or_else(|_| "3".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid CART_IDLE_HOURS: {}", e)))?;
    let cart_retention_days = get_env("CART_RETENTION_DAYS")
      .unwrap_or_else(|_| "7".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid CART_RETENTION_DAYS: {}", e)))?;
    let sweep_interval_secs = get_env("SWEEP_INTERVAL_SECS")
      .unwrap_or_else(|_| "3600".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid SWEEP_INTERVAL_SECS: {}", e)))?;

    if cart_idle_hours <= 0 || cart_retention_days <= 0 {
      return Err(AppError::Config(
        "CART_IDLE_HOURS and CART_RETENTION_DAYS must be positive".to_string(),
      ));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      cart_idle_after: Duration::hours(cart_idle_hours),
      cart_purge_after: Duration::days(cart_retention_days),
      sweep_interval_secs,
    })
  }
}
