// src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use tracing::Level;

use shopcart::config::AppConfig;
use shopcart::repository::{InMemoryStore, PgCartRepository, PgProductRepository};
use shopcart::services;
use shopcart::state::AppState;
use shopcart::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .init();

  tracing::info!("Starting shopping-cart application server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  // Wire the store: Postgres when DATABASE_URL is set, in-memory otherwise.
  let app_state = match &app_config.database_url {
    Some(database_url) => {
      let db_pool = match PgPool::connect(database_url).await {
        Ok(pool) => {
          tracing::info!("Successfully connected to the database.");
          pool
        }
        Err(e) => {
          tracing::error!(error = %e, "Failed to connect to the database.");
          panic!("Database connection error: {}", e);
        }
      };

      if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
        tracing::error!(error = %e, "Failed to run database migrations.");
        panic!("Migration error: {}", e);
      }

      AppState::new(
        Arc::new(PgProductRepository::new(db_pool.clone())),
        Arc::new(PgCartRepository::new(db_pool)),
        app_config.clone(),
      )
    }
    None => {
      tracing::warn!("DATABASE_URL not set; using the in-memory store. Data will not survive a restart.");
      let store = InMemoryStore::new();
      AppState::new(Arc::new(store.clone()), Arc::new(store), app_config.clone())
    }
  };

  // The sweeper runs on its own cadence, independent of request handling.
  tokio::spawn(services::run_sweep_loop(app_state.carts.clone(), app_config.clone()));

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
