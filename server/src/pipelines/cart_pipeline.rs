// src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use bazaar_flow::{ContextData, Pipeline, PipelineControl, Registry};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_add_to_cart_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    &[
      ("validate_cart_input", false, None),
      ("authorize_cart_owner", false, None),
      ("fetch_product_for_cart", false, None),
      ("add_or_update_cart_item_db", false, None),
    ],
  );

  p.on("validate_cart_input", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let quantity = { ctx_data.read().quantity };
      if quantity <= 0 {
        warn!(quantity, "Add to Cart Pipeline: rejected non-positive quantity.");
        return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("authorize_cart_owner", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (store, cart_id, user_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.cart_id, guard.principal.user_id)
      };
      let cart = store
        .get_cart(cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;
      if cart.user_id != user_id {
        warn!(cart_id = %cart_id, user_id = %user_id, "Add to Cart Pipeline: caller does not own the cart.");
        return Err(AppError::PermissionDenied(
          "You can only add items to your own cart.".to_string(),
        ));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("fetch_product_for_cart", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (store, product_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.product_id)
      };
      let product = store
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Product with id {} does not exist", product_id)))?;
      ctx_data.write().product = Some(product);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("add_or_update_cart_item_db", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (store, cart_id, product_id, quantity) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.cart_id, guard.product_id, guard.quantity)
      };
      let item = store.add_cart_item(cart_id, product_id, quantity).await?;
      info!(
        cart_id = %cart_id,
        product_id = %product_id,
        quantity = item.quantity,
        "Add to Cart Pipeline: cart line stored."
      );
      ctx_data.write().updated_cart_item = Some(item);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register(p);
  info!("Add to Cart pipeline registered.");
}
