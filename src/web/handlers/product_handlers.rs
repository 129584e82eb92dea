// src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::ProductInput;
use crate::state::AppState;

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.products.list().await?;
  info!("Successfully fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();

  match app_state.products.get(product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(product)),
    None => {
      warn!("Product with ID {} not found.", product_id);
      Err(AppError::NotFound(format!("Product with ID {} not found", product_id)))
    }
  }
}

#[instrument(name = "handler::create_product", skip(app_state, payload), fields(name = %payload.name))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let input = payload.into_inner();
  input.validate()?;

  let product = app_state.products.create(&input).await?;
  info!(product_id = %product.id, "Product created");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, path, payload), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let input = payload.into_inner();
  input.validate()?;

  match app_state.products.update(product_id, &input).await? {
    Some(product) => Ok(HttpResponse::Ok().json(product)),
    None => Err(AppError::NotFound(format!("Product with ID {} not found", product_id))),
  }
}

#[instrument(name = "handler::delete_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();

  // Removing a catalog product also drops it from every cart; the affected
  // cart totals are refreshed inside the same transaction.
  if app_state.products.delete(product_id).await? {
    info!(product_id = %product_id, "Product deleted");
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::NotFound(format!("Product with ID {} not found", product_id)))
  }
}
