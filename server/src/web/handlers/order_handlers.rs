// src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::services::order_service;
use crate::state::AppState;
use crate::web::extractors::Principal;

#[derive(Deserialize, Debug)]
pub struct CreateOrderPayload {
  pub cart_id: Uuid,
}

#[derive(Deserialize, Debug)]
pub struct UpdateOrderPayload {
  pub status: OrderStatus,
}

#[instrument(name = "handler::list_orders", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let orders = order_service::list_orders(&app_state, principal).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(
    name = "handler::create_order",
    skip(app_state, req_payload, principal),
    fields(user_id = %principal.user_id, cart_id = %req_payload.cart_id)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CreateOrderPayload>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let order = order_service::create_order(&app_state, req_payload.cart_id, principal).await?;
  info!(order_id = %order.order.id, "Checkout completed.");
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::get_order", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let order = order_service::get_order(&app_state, path.into_inner(), principal).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_order", skip(app_state, req_payload, principal), fields(user_id = %principal.user_id))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateOrderPayload>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let order = order_service::update_order_status(&app_state, path.into_inner(), req_payload.status, principal).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::cancel_order", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let order = order_service::cancel_order(&app_state, path.into_inner(), principal).await?;
  Ok(HttpResponse::Ok().json(json!({
      "status": "Order canceled",
      "order": order
  })))
}

#[instrument(name = "handler::has_ordered", skip(app_state, principal), fields(user_id = %principal.user_id))]
pub async fn has_ordered_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let has_ordered = order_service::has_ordered(&app_state, principal, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "hasOrdered": has_ordered })))
}
