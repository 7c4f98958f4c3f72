// src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::cart_service;
use crate::state::AppState;
use crate::web::extractors::Principal;

#[derive(Deserialize, Debug)]
pub struct AddCartItemPayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCartItemPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::create_cart", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn create_cart_handler(
  app_state: web::Data<AppState>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let (cart, created) = cart_service::get_or_create_cart(&app_state, principal).await?;
  if created {
    Ok(HttpResponse::Created().json(cart))
  } else {
    Ok(HttpResponse::Ok().json(cart))
  }
}

#[instrument(name = "handler::get_cart", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let view = cart_service::get_cart(&app_state, path.into_inner(), principal).await?;
  Ok(HttpResponse::Ok().json(view))
}

#[instrument(name = "handler::delete_cart", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn delete_cart_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  cart_service::delete_cart(&app_state, path.into_inner(), principal).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, principal),
    fields(user_id = %principal.user_id, product_id = %req_payload.product_id, quantity = %req_payload.quantity)
)]
pub async fn add_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<AddCartItemPayload>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let cart_id = path.into_inner();
  let item = cart_service::add_item(
    &app_state,
    cart_id,
    req_payload.product_id,
    req_payload.quantity,
    principal,
  )
  .await?;

  info!(
    item_id = %item.id,
    quantity = item.quantity,
    "Add to cart successful."
  );
  Ok(HttpResponse::Created().json(json!({
      "message": "Item added to cart successfully.",
      "cartItem": item
  })))
}

#[instrument(name = "handler::update_cart_item", skip(app_state, req_payload, principal), fields(user_id = %principal.user_id))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(Uuid, Uuid)>,
  req_payload: web::Json<UpdateCartItemPayload>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let (cart_id, item_id) = path.into_inner();
  let item = cart_service::update_item(&app_state, cart_id, item_id, req_payload.quantity, principal).await?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  path: web::Path<(Uuid, Uuid)>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let (cart_id, item_id) = path.into_inner();
  cart_service::remove_item(&app_state, cart_id, item_id, principal).await?;
  Ok(HttpResponse::NoContent().finish())
}
