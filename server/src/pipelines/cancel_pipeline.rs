// src/pipelines/cancel_pipeline.rs

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::CancelOrderCtxData;
use crate::state::AppState;
use bazaar_flow::{ContextData, Pipeline, PipelineControl, Registry};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_cancel_order_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<CancelOrderCtxData, AppError>::new(
    "cancel_order",
    &[
      ("load_order", false, None),
      ("authorize_cancellation", false, None),
      ("guard_cancellable", false, None),
      ("apply_cancellation", false, None),
    ],
  );

  p.on("load_order", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let (store, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id)
      };
      let order = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Staff may cancel any order.
  p.on("authorize_cancellation", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      if guard.principal.is_staff {
        return Ok::<_, AppError>(PipelineControl::Continue);
      }
      let owner_id = guard.order.as_ref().map(|o| o.user_id);
      if owner_id != Some(guard.principal.user_id) {
        warn!(order_id = %guard.order_id, user_id = %guard.principal.user_id, "cancellation denied");
        return Err(AppError::PermissionDenied(
          "You do not have permission to cancel this order.".to_string(),
        ));
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on("guard_cancellable", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      match guard.order.as_ref().map(|o| o.status) {
        Some(OrderStatus::Delivered) => Err(AppError::InvalidStateTransition(
          "You can not cancel an order that has already been delivered.".to_string(),
        )),
        Some(OrderStatus::Canceled) => {
          info!(order_id = %guard.order_id, "order already canceled; nothing to do");
          Ok(PipelineControl::Stop)
        }
        Some(_) => Ok(PipelineControl::Continue),
        None => Err(AppError::Internal("order not loaded before cancellation".to_string())),
      }
    })
  });

  p.on("apply_cancellation", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let (store, order_id, current) = {
        let guard = ctx_data.read();
        let current = guard
          .order
          .as_ref()
          .map(|o| o.status)
          .ok_or_else(|| AppError::Internal("order not loaded before cancellation".to_string()))?;
        (guard.app_state.store.clone(), guard.order_id, current)
      };

      if let Some(updated) = store
        .compare_and_set_status(order_id, current, OrderStatus::Canceled)
        .await?
      {
        info!(order_id = %order_id, from = %current, "order canceled");
        ctx_data.write().order = Some(updated);
        return Ok::<_, AppError>(PipelineControl::Continue);
      }

      // Someone else changed the status between load and update.
      let reread = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
      match reread.status {
        OrderStatus::Canceled => {
          info!(order_id = %order_id, "order was canceled concurrently");
          ctx_data.write().order = Some(reread);
          Ok(PipelineControl::Continue)
        }
        other if other.can_transition_to(OrderStatus::Canceled) => {
          warn!(order_id = %order_id, expected = %current, found = %other, "status moved during cancellation");
          Err(AppError::InvalidStateTransition(format!(
            "Order status changed to '{}' while canceling; please retry.",
            other
          )))
        }
        other => Err(AppError::InvalidStateTransition(format!(
          "Order can no longer be canceled (status '{}').",
          other
        ))),
      }
    })
  });

  registry.register(p);
  info!("Cancel order pipeline registered.");
}
