// src/pipelines/callback_pipeline.rs

//! Gateway return URLs. Only a success callback touches the order; fail and
//! cancel just send the customer back to the dashboard.

use crate::errors::AppError;
use crate::models::{CallbackKind, OrderStatus, TransactionId};
use crate::pipelines::contexts::{CallbackOutcome, PaymentCallbackCtxData};
use crate::state::AppState;
use bazaar_flow::{ContextData, Pipeline, PipelineControl, Registry, SkipCondition};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_payment_callback_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let unless_success: SkipCondition<PaymentCallbackCtxData> =
    Arc::new(|ctx_data: &ContextData<PaymentCallbackCtxData>| ctx_data.read().kind != CallbackKind::Success);

  let mut p = Pipeline::<PaymentCallbackCtxData, AppError>::new(
    "payment_callback",
    &[
      ("parse_transaction_id", false, Some(unless_success.clone())),
      ("apply_payment_success", false, Some(unless_success)),
      ("resolve_redirect", false, None),
    ],
  );

  p.on("parse_transaction_id", |ctx_data: ContextData<PaymentCallbackCtxData>| {
    Box::pin(async move {
      let raw = { ctx_data.read().raw_transaction_id.clone() };
      let transaction_id = raw.parse::<TransactionId>().map_err(|e| {
        warn!(tran_id = %raw, error = %e, "rejecting payment callback");
        AppError::CallbackParse(e.to_string())
      })?;
      ctx_data.write().order_id = Some(transaction_id.order_id());
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("apply_payment_success", |ctx_data: ContextData<PaymentCallbackCtxData>| {
    Box::pin(async move {
      let (store, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id)
      };
      let order_id = order_id.ok_or_else(|| AppError::Internal("transaction id not parsed".to_string()))?;
      let order = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

      let mut status = order.status;
      if status == OrderStatus::Pending {
        match store
          .compare_and_set_status(order_id, OrderStatus::Pending, OrderStatus::Received)
          .await?
        {
          Some(_) => {
            info!(order_id = %order_id, "payment received");
            ctx_data.write().outcome = Some(CallbackOutcome::MarkedReceived);
            return Ok::<_, AppError>(PipelineControl::Continue);
          }
          None => {
            status = store
              .get_order(order_id)
              .await?
              .map(|o| o.status)
              .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
          }
        }
      }

      let outcome = match status {
        OrderStatus::Received => {
          info!(order_id = %order_id, "duplicate payment callback; order already received");
          CallbackOutcome::AlreadyReceived
        }
        closed => {
          warn!(order_id = %order_id, status = %closed, "payment success reported for a closed order; leaving it unchanged");
          CallbackOutcome::IgnoredClosed
        }
      };
      ctx_data.write().outcome = Some(outcome);
      Ok(PipelineControl::Continue)
    })
  });

  p.on("resolve_redirect", |ctx_data: ContextData<PaymentCallbackCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      guard.redirect_url = Some(format!("{}/dashboard/orders/", guard.app_state.config.frontend_base_url));
      if guard.kind != CallbackKind::Success {
        info!(kind = guard.kind.as_str(), tran_id = %guard.raw_transaction_id, "payment not completed");
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register(p);
  info!("Payment callback pipeline registered.");
}
