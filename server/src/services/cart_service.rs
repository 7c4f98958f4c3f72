// src/services/cart_service.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Cart, CartItem, CartView, Principal};
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use bazaar_flow::{ContextData, PipelineResult};
use tracing::{info, instrument};
use uuid::Uuid;

/// Returns the caller's cart, creating it if needed. The flag tells whether
/// it was created by this call.
#[instrument(name = "cart_service::get_or_create_cart", skip(app_state), fields(user_id = %principal.user_id))]
pub async fn get_or_create_cart(app_state: &AppState, principal: Principal) -> AppResult<(Cart, bool)> {
  if app_state.store.get_user(principal.user_id).await?.is_none() {
    return Err(AppError::NotFound(format!("User {} not found", principal.user_id)));
  }
  let (cart, created) = app_state.store.get_or_create_cart(principal.user_id).await?;
  if created {
    info!(cart_id = %cart.id, "cart created");
  }
  Ok((cart, created))
}

async fn owned_cart(app_state: &AppState, cart_id: Uuid, principal: Principal) -> AppResult<Cart> {
  let cart = app_state
    .store
    .get_cart(cart_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;
  if !principal.can_access(cart.user_id) {
    return Err(AppError::PermissionDenied("This cart belongs to another user.".to_string()));
  }
  Ok(cart)
}

pub async fn get_cart(app_state: &AppState, cart_id: Uuid, principal: Principal) -> AppResult<CartView> {
  let cart = owned_cart(app_state, cart_id, principal).await?;
  let lines = app_state.store.list_cart_lines(cart_id).await?;
  CartView::from_lines(cart, lines)
}

#[instrument(
  name = "cart_service::add_item",
  skip(app_state),
  fields(cart_id = %cart_id, product_id = %product_id, user_id = %principal.user_id)
)]
pub async fn add_item(
  app_state: &AppState,
  cart_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  principal: Principal,
) -> AppResult<CartItem> {
  let ctx_data = ContextData::new(AddToCartCtxData {
    app_state: app_state.clone(),
    principal,
    cart_id,
    product_id,
    quantity,
    product: None,
    updated_cart_item: None,
  });

  match app_state.pipelines.run(ctx_data.clone()).await? {
    PipelineResult::Completed => ctx_data
      .write()
      .updated_cart_item
      .take()
      .ok_or_else(|| AppError::Internal("Cart update completed, but item details are unavailable.".to_string())),
    PipelineResult::Stopped => Err(AppError::PipelineHaltedByHandler),
  }
}

async fn owned_item(app_state: &AppState, cart_id: Uuid, item_id: Uuid, principal: Principal) -> AppResult<CartItem> {
  owned_cart(app_state, cart_id, principal).await?;
  app_state
    .store
    .get_cart_item(item_id)
    .await?
    .filter(|item| item.cart_id == cart_id)
    .ok_or_else(|| AppError::NotFound(format!("Cart item {} not found", item_id)))
}

pub async fn update_item(
  app_state: &AppState,
  cart_id: Uuid,
  item_id: Uuid,
  quantity: i32,
  principal: Principal,
) -> AppResult<CartItem> {
  if quantity <= 0 {
    return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
  }
  owned_item(app_state, cart_id, item_id, principal).await?;
  app_state
    .store
    .set_cart_item_quantity(item_id, quantity)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cart item {} not found", item_id)))
}

pub async fn remove_item(app_state: &AppState, cart_id: Uuid, item_id: Uuid, principal: Principal) -> AppResult<()> {
  owned_item(app_state, cart_id, item_id, principal).await?;
  app_state.store.delete_cart_item(item_id).await?;
  Ok(())
}

pub async fn delete_cart(app_state: &AppState, cart_id: Uuid, principal: Principal) -> AppResult<()> {
  owned_cart(app_state, cart_id, principal).await?;
  if !app_state.store.delete_cart(cart_id).await? {
    return Err(AppError::NotFound(format!("Cart {} not found", cart_id)));
  }
  info!(cart_id = %cart_id, "cart deleted");
  Ok(())
}
