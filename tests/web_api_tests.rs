// tests/web_api_tests.rs
mod common; // Reference the common module

use std::sync::Arc;

use actix_web::{test, web, App};
use chrono::Duration;
use serde_json::{json, Value};

use common::setup_tracing;
use shopcart::config::AppConfig;
use shopcart::repository::InMemoryStore;
use shopcart::state::AppState;
use shopcart::web::configure_app_routes;

const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

fn test_config() -> Arc<AppConfig> {
  Arc::new(AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: None,
    cart_idle_after: Duration::hours(3),
    cart_purge_after: Duration::days(7),
    sweep_interval_secs: 3600,
  })
}

fn test_state() -> AppState {
  setup_tracing();
  let store = InMemoryStore::new();
  AppState::new(Arc::new(store.clone()), Arc::new(store), test_config())
}

macro_rules! test_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

macro_rules! create_product {
  ($app:expr, $name:expr, $price_cents:expr) => {{
    let req = test::TestRequest::post()
      .uri("/api/v1/products")
      .set_json(json!({ "name": $name, "price_cents": $price_cents }))
      .to_request();
    let resp = test::call_service($app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    body
  }};
}

#[actix_web::test]
async fn test_health_endpoint() {
  let state = test_state();
  let app = test_app!(state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_show_cart_creates_session_and_empty_cart() {
  let state = test_state();
  let app = test_app!(state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/carts").to_request()).await;
  assert_eq!(resp.status(), 200);
  assert!(resp.headers().contains_key(SESSION_TOKEN_HEADER));

  let body: Value = test::read_body_json(resp).await;
  assert!(body.get("id").is_some());
  assert_eq!(body["products"], json!([]));
  assert_eq!(body["total_price_cents"], 0);
}

#[actix_web::test]
async fn test_create_item_sets_quantity_and_returns_summary() {
  let state = test_state();
  let app = test_app!(state);
  let product = create_product!(&app, "Test Product", 1000);

  let req = test::TestRequest::post()
    .uri("/api/v1/carts")
    .set_json(json!({ "product_id": product["id"], "quantity": 2 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 201);

  let token = resp
    .headers()
    .get(SESSION_TOKEN_HEADER)
    .unwrap()
    .to_str()
    .unwrap()
    .to_string();

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["products"].as_array().unwrap().len(), 1);
  assert_eq!(body["products"][0]["name"], "Test Product");
  assert_eq!(body["products"][0]["quantity"], 2);
  assert_eq!(body["total_price_cents"], 2000);

  // Re-posting with the same session replaces the quantity.
  let req = test::TestRequest::post()
    .uri("/api/v1/carts")
    .insert_header((SESSION_TOKEN_HEADER, token.clone()))
    .set_json(json!({ "product_id": product["id"], "quantity": 3 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 201);

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["products"][0]["quantity"], 3);
  assert_eq!(body["total_price_cents"], 3000);

  // And the session still resolves to the same cart on a plain read.
  let req = test::TestRequest::get()
    .uri("/api/v1/carts")
    .insert_header((SESSION_TOKEN_HEADER, token))
    .to_request();
  let resp = test::call_service(&app, req).await;
  let shown: Value = test::read_body_json(resp).await;
  assert_eq!(shown["id"], body["id"]);
}

#[actix_web::test]
async fn test_add_item_accumulates_over_requests() {
  let state = test_state();
  let app = test_app!(state);
  let product = create_product!(&app, "Test Product", 1000);

  let req = test::TestRequest::post()
    .uri("/api/v1/carts/add_item")
    .set_json(json!({ "product_id": product["id"], "quantity": 1 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);
  let token = resp
    .headers()
    .get(SESSION_TOKEN_HEADER)
    .unwrap()
    .to_str()
    .unwrap()
    .to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/carts/add_item")
    .insert_header((SESSION_TOKEN_HEADER, token))
    .set_json(json!({ "product_id": product["id"], "quantity": 3 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["products"][0]["quantity"], 4);
  assert_eq!(body["total_price_cents"], 4000);
}

#[actix_web::test]
async fn test_invalid_quantity_is_unprocessable_with_error_list() {
  let state = test_state();
  let app = test_app!(state);
  let product = create_product!(&app, "Test Product", 1000);

  let req = test::TestRequest::post()
    .uri("/api/v1/carts")
    .set_json(json!({ "product_id": product["id"], "quantity": 0 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 422);

  let body: Value = test::read_body_json(resp).await;
  assert!(body["errors"].as_array().unwrap().len() > 0);
}

#[actix_web::test]
async fn test_unknown_product_is_not_found() {
  let state = test_state();
  let app = test_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/v1/carts")
    .set_json(json!({ "product_id": uuid::Uuid::new_v4(), "quantity": 1 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_remove_item_round_trip() {
  let state = test_state();
  let app = test_app!(state);
  let product = create_product!(&app, "Test Product", 1000);
  let product_id = product["id"].as_str().unwrap().to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/carts")
    .set_json(json!({ "product_id": product_id, "quantity": 2 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  let token = resp
    .headers()
    .get(SESSION_TOKEN_HEADER)
    .unwrap()
    .to_str()
    .unwrap()
    .to_string();

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/carts/{}", product_id))
    .insert_header((SESSION_TOKEN_HEADER, token.clone()))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["products"], json!([]));
  assert_eq!(body["total_price_cents"], 0);

  // Removing it again is a 404; the cart stays as it was.
  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/carts/{}", product_id))
    .insert_header((SESSION_TOKEN_HEADER, token))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_product_crud_round_trip() {
  let state = test_state();
  let app = test_app!(state);
  let product = create_product!(&app, "Widget", 999);
  let product_id = product["id"].as_str().unwrap().to_string();

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/products").to_request()).await;
  assert_eq!(resp.status(), 200);
  let listed: Value = test::read_body_json(resp).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);

  let req = test::TestRequest::put()
    .uri(&format!("/api/v1/products/{}", product_id))
    .set_json(json!({ "name": "Widget Mk II", "price_cents": 1299 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 200);
  let updated: Value = test::read_body_json(resp).await;
  assert_eq!(updated["name"], "Widget Mk II");

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/products/{}", product_id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 204);

  let resp = test::call_service(
    &app,
    test::TestRequest::get()
      .uri(&format!("/api/v1/products/{}", product_id))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_invalid_product_payload_is_unprocessable() {
  let state = test_state();
  let app = test_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/v1/products")
    .set_json(json!({ "name": "", "price_cents": -5 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), 422);

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}
