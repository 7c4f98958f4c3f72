// src/services/payment_service.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::{CallbackKind, Principal};
use crate::pipelines::contexts::{InitiatePaymentCtxData, PaymentCallbackCtxData};
use crate::state::AppState;
use bazaar_flow::{ContextData, PipelineResult};
use tracing::instrument;
use uuid::Uuid;

/// Opens a hosted payment page for the order and returns its URL.
#[instrument(name = "payment_service::initiate_payment", skip(app_state), fields(order_id = %order_id, user_id = %principal.user_id))]
pub async fn initiate_payment(
  app_state: &AppState,
  order_id: Uuid,
  client_amount_cents: Option<i64>,
  num_items: Option<u32>,
  principal: Principal,
) -> AppResult<String> {
  let ctx_data = ContextData::new(InitiatePaymentCtxData::new(
    app_state.clone(),
    principal,
    order_id,
    client_amount_cents,
    num_items,
  ));

  match app_state.pipelines.run(ctx_data.clone()).await? {
    PipelineResult::Completed => ctx_data
      .write()
      .payment_url
      .take()
      .ok_or_else(|| AppError::Internal("Payment session created without a URL.".to_string())),
    PipelineResult::Stopped => Err(AppError::PipelineHaltedByHandler),
  }
}

/// Reconciles a gateway callback and returns where to send the customer.
#[instrument(name = "payment_service::handle_payment_callback", skip(app_state), fields(kind = kind.as_str()))]
pub async fn handle_payment_callback(
  app_state: &AppState,
  kind: CallbackKind,
  transaction_id: &str,
) -> AppResult<String> {
  let ctx_data = ContextData::new(PaymentCallbackCtxData::new(
    app_state.clone(),
    kind,
    transaction_id.to_string(),
  ));

  match app_state.pipelines.run(ctx_data.clone()).await? {
    PipelineResult::Completed => ctx_data
      .write()
      .redirect_url
      .take()
      .ok_or_else(|| AppError::Internal("Payment callback handled without a redirect.".to_string())),
    PipelineResult::Stopped => Err(AppError::PipelineHaltedByHandler),
  }
}
