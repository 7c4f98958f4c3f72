// src/pipelines/checkout_pipeline.rs

//! Cart → order conversion.

use crate::errors::AppError;
use crate::models::NewOrder;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use bazaar_flow::{ContextData, Pipeline, PipelineControl, Registry};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_checkout_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(
    "checkout",
    &[
      ("load_checkout_actor", false, None),
      ("load_cart_snapshot", false, None),
      ("ensure_cart_not_empty", false, None),
      ("commit_order", false, None),
    ],
  );

  p.on("load_checkout_actor", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (store, user_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.principal.user_id)
      };
      let actor = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
      ctx_data.write().actor = Some(actor);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("load_cart_snapshot", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (store, cart_id, user_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.cart_id, guard.principal.user_id)
      };
      let snapshot = store
        .load_cart_with_items_and_prices(cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;

      if snapshot.user_id != user_id {
        warn!(cart_id = %cart_id, user_id = %user_id, "checkout attempted on someone else's cart");
        return Err(AppError::PermissionDenied(
          "You can only place orders from your own cart.".to_string(),
        ));
      }
      ctx_data.write().snapshot = Some(snapshot);
      Ok(PipelineControl::Continue)
    })
  });

  p.on("ensure_cart_not_empty", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let line_count = ctx_data.read().snapshot.as_ref().map_or(0, |s| s.lines.len());
      if line_count == 0 {
        return Err(AppError::Validation("cart is empty".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("commit_order", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (store, cart_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.cart_id)
      };
      let order = store.convert_cart_to_order(cart_id, NewOrder::from_snapshot).await?;
      info!(
        order_id = %order.order.id,
        items = order.items.len(),
        total_price_cents = order.order.total_price_cents,
        "order placed"
      );
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register(p);
  info!("Checkout pipeline registered.");
}
