// src/web/handlers/payment_handlers.rs

use actix_web::http::header;
use actix_web::{web, Either, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::payment::parse_amount;
use crate::models::CallbackKind;
use crate::services::payment_service;
use crate::state::AppState;
use crate::web::extractors::Principal;

#[derive(Deserialize, Debug)]
pub struct InitiatePaymentPayload {
  pub order_id: Uuid,
  /// Decimal amount as a JSON number or string, e.g. `25` or `"25.00"`.
  #[serde(default)]
  pub amount: Option<JsonValue>,
  #[serde(default)]
  pub num_items: Option<u32>,
}

/// Gateway callbacks post many fields; only the transaction id matters here.
#[derive(Deserialize, Debug, Default)]
pub struct CallbackPayload {
  #[serde(default)]
  pub tran_id: Option<String>,
}

type CallbackBody = Option<Either<web::Form<CallbackPayload>, web::Json<CallbackPayload>>>;

fn client_amount_cents(amount: Option<&JsonValue>) -> Result<Option<i64>, AppError> {
  let raw = match amount {
    None | Some(JsonValue::Null) => return Ok(None),
    Some(JsonValue::Number(n)) => n.to_string(),
    Some(JsonValue::String(s)) => s.clone(),
    Some(_) => return Err(AppError::Validation("amount must be a number".to_string())),
  };
  parse_amount(&raw)
    .map(Some)
    .ok_or_else(|| AppError::Validation(format!("Invalid amount '{}'", raw)))
}

#[instrument(
    name = "handler::initiate_payment",
    skip(app_state, req_payload, principal),
    fields(user_id = %principal.user_id, order_id = %req_payload.order_id)
)]
pub async fn initiate_payment_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<InitiatePaymentPayload>,
  principal: Principal,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let amount_cents = client_amount_cents(payload.amount.as_ref())?;
  let payment_url =
    payment_service::initiate_payment(&app_state, payload.order_id, amount_cents, payload.num_items, principal).await?;
  info!("Payment session ready.");
  Ok(HttpResponse::Ok().json(json!({ "payment_url": payment_url })))
}

async fn handle_callback(app_state: &AppState, kind: CallbackKind, body: CallbackBody) -> Result<HttpResponse, AppError> {
  let tran_id = match body {
    Some(Either::Left(form)) => form.into_inner().tran_id,
    Some(Either::Right(json)) => json.into_inner().tran_id,
    None => None,
  }
  .unwrap_or_default();

  let redirect_url = payment_service::handle_payment_callback(app_state, kind, &tran_id).await?;
  Ok(
    HttpResponse::Found()
      .insert_header((header::LOCATION, redirect_url))
      .finish(),
  )
}

#[instrument(name = "handler::payment_success", skip_all)]
pub async fn payment_success_handler(
  app_state: web::Data<AppState>,
  body: CallbackBody,
) -> Result<HttpResponse, AppError> {
  handle_callback(&app_state, CallbackKind::Success, body).await
}

#[instrument(name = "handler::payment_fail", skip_all)]
pub async fn payment_fail_handler(app_state: web::Data<AppState>, body: CallbackBody) -> Result<HttpResponse, AppError> {
  handle_callback(&app_state, CallbackKind::Fail, body).await
}

#[instrument(name = "handler::payment_cancel", skip_all)]
pub async fn payment_cancel_handler(
  app_state: web::Data<AppState>,
  body: CallbackBody,
) -> Result<HttpResponse, AppError> {
  handle_callback(&app_state, CallbackKind::Cancel, body).await
}
