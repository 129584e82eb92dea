// src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{cart_handlers, product_handlers};

// In a real deployment this might also check DB connectivity.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Cart Routes: one session-scoped cart, identified by the
      // X-Session-Token header the responses hand back.
      .service(
        web::scope("/carts")
          .route("", web::get().to(cart_handlers::show_cart_handler))
          .route("", web::post().to(cart_handlers::create_cart_item_handler))
          .route("/add_item", web::post().to(cart_handlers::add_cart_item_handler))
          .route("/{product_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
      )
      // Product Catalog Routes
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
          .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
      ),
  );
}
