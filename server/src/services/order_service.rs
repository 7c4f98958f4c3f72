// src/services/order_service.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, OrderDetail, OrderStatus, Principal};
use crate::pipelines::contexts::{CancelOrderCtxData, CheckoutCtxData};
use crate::state::AppState;
use bazaar_flow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Converts the caller's cart into a pending order.
#[instrument(name = "order_service::create_order", skip(app_state), fields(cart_id = %cart_id, user_id = %principal.user_id))]
pub async fn create_order(app_state: &AppState, cart_id: Uuid, principal: Principal) -> AppResult<OrderDetail> {
  let ctx_data = ContextData::new(CheckoutCtxData::new(app_state.clone(), principal, cart_id));

  match app_state.pipelines.run(ctx_data.clone()).await? {
    PipelineResult::Completed => ctx_data.write().order.take().ok_or_else(|| {
      warn!("Checkout pipeline completed but no order was recorded.");
      AppError::Internal("Checkout completed, but the order is unavailable.".to_string())
    }),
    PipelineResult::Stopped => Err(AppError::PipelineHaltedByHandler),
  }
}

/// Cancels an order. Canceling an already canceled order returns it unchanged.
#[instrument(name = "order_service::cancel_order", skip(app_state), fields(order_id = %order_id, user_id = %principal.user_id))]
pub async fn cancel_order(app_state: &AppState, order_id: Uuid, principal: Principal) -> AppResult<Order> {
  let ctx_data = ContextData::new(CancelOrderCtxData::new(app_state.clone(), principal, order_id));

  // `Stopped` is the idempotent path; the order is still in the context.
  let result = app_state.pipelines.run(ctx_data.clone()).await?;
  let order = ctx_data.write().order.take();
  order.ok_or_else(|| AppError::Internal(format!("Cancel pipeline ended ({:?}) without an order", result)))
}

/// Whether `principal` has any order containing `product_id`.
pub async fn has_ordered(app_state: &AppState, principal: Principal, product_id: Uuid) -> AppResult<bool> {
  app_state.store.has_ordered(principal.user_id, product_id).await
}

/// Staff-only status edit. Moving to the current status is a no-op.
#[instrument(name = "order_service::update_order_status", skip(app_state), fields(order_id = %order_id, next = %next))]
pub async fn update_order_status(
  app_state: &AppState,
  order_id: Uuid,
  next: OrderStatus,
  principal: Principal,
) -> AppResult<Order> {
  if !principal.is_staff {
    return Err(AppError::PermissionDenied(
      "Only staff can change an order's status.".to_string(),
    ));
  }
  let order = app_state
    .store
    .get_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
  if order.status == next {
    return Ok(order);
  }
  if !order.status.can_transition_to(next) {
    return Err(AppError::InvalidStateTransition(format!(
      "Can not move an order from '{}' to '{}'.",
      order.status, next
    )));
  }

  let updated = app_state
    .store
    .compare_and_set_status(order_id, order.status, next)
    .await?
    .ok_or_else(|| {
      AppError::InvalidStateTransition("Order status changed concurrently; please retry.".to_string())
    })?;
  info!(from = %order.status, "order status updated");
  Ok(updated)
}

/// Other users' orders are reported as missing rather than forbidden.
pub async fn get_order(app_state: &AppState, order_id: Uuid, principal: Principal) -> AppResult<OrderDetail> {
  app_state
    .store
    .get_order_detail(order_id)
    .await?
    .filter(|detail| principal.can_access(detail.order.user_id))
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

pub async fn list_orders(app_state: &AppState, principal: Principal) -> AppResult<Vec<OrderDetail>> {
  let owner = if principal.is_staff { None } else { Some(principal.user_id) };
  app_state.store.list_orders(owner).await
}
