// src/pipelines/contexts.rs

//! Data each pipeline runs over. Handlers receive these wrapped in
//! `bazaar_flow::ContextData`; the registry picks the pipeline by type.

use crate::models::{CallbackKind, CartItem, CartSnapshot, Order, OrderDetail, PaymentSessionRequest, Principal, Product, User};
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub cart_id: Uuid,
  pub actor: Option<User>,
  pub snapshot: Option<CartSnapshot>,
  pub order: Option<OrderDetail>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, principal: Principal, cart_id: Uuid) -> Self {
    Self {
      app_state,
      principal,
      cart_id,
      actor: None,
      snapshot: None,
      order: None,
    }
  }
}

#[derive(Clone)]
pub struct CancelOrderCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub order_id: Uuid,
  pub order: Option<Order>,
}

impl CancelOrderCtxData {
  pub fn new(app_state: AppState, principal: Principal, order_id: Uuid) -> Self {
    Self {
      app_state,
      principal,
      order_id,
      order: None,
    }
  }
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: Option<Product>,
  pub updated_cart_item: Option<CartItem>,
}

#[derive(Clone)]
pub struct InitiatePaymentCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub order_id: Uuid,
  /// Amount the client believes it is paying, in minor units.
  pub client_amount_cents: Option<i64>,
  pub requested_num_items: Option<u32>,
  pub order: Option<OrderDetail>,
  pub amount_cents: i64,
  pub num_items: u32,
  pub customer: Option<User>,
  pub session_request: Option<PaymentSessionRequest>,
  pub payment_url: Option<String>,
}

impl InitiatePaymentCtxData {
  pub fn new(
    app_state: AppState,
    principal: Principal,
    order_id: Uuid,
    client_amount_cents: Option<i64>,
    requested_num_items: Option<u32>,
  ) -> Self {
    Self {
      app_state,
      principal,
      order_id,
      client_amount_cents,
      requested_num_items,
      order: None,
      amount_cents: 0,
      num_items: 0,
      customer: None,
      session_request: None,
      payment_url: None,
    }
  }
}

/// What a success callback did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
  MarkedReceived,
  AlreadyReceived,
  /// The order was closed (canceled or delivered) and was left as is.
  IgnoredClosed,
}

#[derive(Clone)]
pub struct PaymentCallbackCtxData {
  pub app_state: AppState,
  pub kind: CallbackKind,
  pub raw_transaction_id: String,
  pub order_id: Option<Uuid>,
  pub outcome: Option<CallbackOutcome>,
  pub redirect_url: Option<String>,
}

impl PaymentCallbackCtxData {
  pub fn new(app_state: AppState, kind: CallbackKind, raw_transaction_id: String) -> Self {
    Self {
      app_state,
      kind,
      raw_transaction_id,
      order_id: None,
      outcome: None,
      redirect_url: None,
    }
  }
}
