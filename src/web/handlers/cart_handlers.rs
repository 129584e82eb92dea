// src/web/handlers/cart_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::CartSummary;
use crate::state::AppState;

pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

// --- Session token extractor ---
// The boundary only ever sees the opaque token, never a session object. The
// client persists whatever token the response hands back and replays it on
// the next request; absence simply means a new session.
#[derive(Debug)]
pub struct SessionToken(pub Option<String>);

impl FromRequest for SessionToken {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let token = req
      .headers()
      .get(SESSION_TOKEN_HEADER)
      .and_then(|value| value.to_str().ok())
      .map(str::to_string);
    futures_util::future::ready(Ok(SessionToken(token)))
  }
}

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct CartItemPayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

fn cart_response(status: StatusCode, token: &str, summary: CartSummary) -> HttpResponse {
  HttpResponseBuilder::new(status)
    .insert_header((SESSION_TOKEN_HEADER, token))
    .json(summary)
}

// --- Handler implementations ---

#[instrument(name = "handler::show_cart", skip(app_state, session))]
pub async fn show_cart_handler(
  app_state: web::Data<AppState>,
  session: SessionToken,
) -> Result<HttpResponse, AppError> {
  let resolved = app_state.session_resolver.resolve(session.0.as_deref()).await?;
  let summary = app_state.cart_service.summary(&resolved.cart).await?;
  Ok(cart_response(StatusCode::OK, &resolved.token, summary))
}

#[instrument(
    name = "handler::create_cart_item",
    skip(app_state, session, payload),
    fields(product_id = %payload.product_id, quantity = %payload.quantity)
)]
pub async fn create_cart_item_handler(
  app_state: web::Data<AppState>,
  session: SessionToken,
  payload: web::Json<CartItemPayload>,
) -> Result<HttpResponse, AppError> {
  let resolved = app_state.session_resolver.resolve(session.0.as_deref()).await?;
  info!(cart_id = %resolved.cart.id, "Setting cart item quantity");

  let summary = app_state
    .cart_service
    .set_item(&resolved.cart, payload.product_id, payload.quantity)
    .await?;
  Ok(cart_response(StatusCode::CREATED, &resolved.token, summary))
}

#[instrument(
    name = "handler::add_cart_item",
    skip(app_state, session, payload),
    fields(product_id = %payload.product_id, quantity = %payload.quantity)
)]
pub async fn add_cart_item_handler(
  app_state: web::Data<AppState>,
  session: SessionToken,
  payload: web::Json<CartItemPayload>,
) -> Result<HttpResponse, AppError> {
  let resolved = app_state.session_resolver.resolve(session.0.as_deref()).await?;
  info!(cart_id = %resolved.cart.id, "Adding quantity to cart item");

  let summary = app_state
    .cart_service
    .add_item(&resolved.cart, payload.product_id, payload.quantity)
    .await?;
  Ok(cart_response(StatusCode::OK, &resolved.token, summary))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, session, path), fields(product_id = %path.as_ref()))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  session: SessionToken,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let resolved = app_state.session_resolver.resolve(session.0.as_deref()).await?;
  info!(cart_id = %resolved.cart.id, "Removing cart item");

  let summary = app_state.cart_service.remove_item(&resolved.cart, product_id).await?;
  Ok(cart_response(StatusCode::OK, &resolved.token, summary))
}
