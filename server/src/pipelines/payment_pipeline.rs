// src/pipelines/payment_pipeline.rs

//! Opens a hosted payment session for a pending order. Nothing on this path
//! writes to the order.

use crate::errors::AppError;
use crate::models::payment::{
  format_amount, DEFAULT_CUSTOMER_CITY, DEFAULT_CUSTOMER_COUNTRY, PRODUCT_CATEGORY, PRODUCT_NAME, PRODUCT_PROFILE,
  SHIPPING_METHOD,
};
use crate::models::{CustomerInfo, OrderStatus, PaymentSessionRequest, TransactionId};
use crate::pipelines::contexts::InitiatePaymentCtxData;
use crate::state::AppState;
use bazaar_flow::{ContextData, Pipeline, PipelineControl, Registry};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_initiate_payment_pipeline(registry: &Arc<Registry<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<InitiatePaymentCtxData, AppError>::new(
    "initiate_payment",
    &[
      ("load_order_for_payment", false, None),
      ("ensure_order_payable", false, None),
      ("reconcile_amount", false, None),
      ("load_customer", false, None),
      ("build_session_request", false, None),
      ("create_hosted_session", false, None),
    ],
  );

  p.on("load_order_for_payment", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let (store, order_id, principal) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id, guard.principal)
      };
      let order = store
        .get_order_detail(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
      if !principal.can_access(order.order.user_id) {
        warn!(order_id = %order_id, user_id = %principal.user_id, "payment requested for someone else's order");
        return Err(AppError::PermissionDenied(
          "You can only pay for your own orders.".to_string(),
        ));
      }
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("ensure_order_payable", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let status = ctx_data.read().order.as_ref().map(|o| o.order.status);
      match status {
        Some(OrderStatus::Pending) => Ok::<_, AppError>(PipelineControl::Continue),
        Some(other) => Err(AppError::InvalidStateTransition(format!(
          "Only pending orders can be paid (order is '{}').",
          other
        ))),
        None => Err(AppError::Internal("order not loaded before payment".to_string())),
      }
    })
  });

  // The gateway is always charged the stored total; a differing client
  // amount is treated as tampering.
  p.on("reconcile_amount", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let (total, line_count) = match guard.order.as_ref() {
        Some(order) => (order.order.total_price_cents, order.items.len()),
        None => return Err(AppError::Internal("order not loaded before payment".to_string())),
      };
      if let Some(claimed) = guard.client_amount_cents {
        if claimed != total {
          warn!(
            order_id = %guard.order_id,
            claimed_cents = claimed,
            total_cents = total,
            "payment amount does not match the order total"
          );
          return Err(AppError::Validation(
            "Payment amount does not match the order total.".to_string(),
          ));
        }
      }
      let num_items = match guard.requested_num_items {
        Some(0) => return Err(AppError::Validation("num_items must be at least 1.".to_string())),
        Some(n) => n,
        None => u32::try_from(line_count).map_err(|_| AppError::Validation("Too many order lines.".to_string()))?,
      };
      guard.amount_cents = total;
      guard.num_items = num_items;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("load_customer", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let (store, owner_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order.as_ref().map(|o| o.order.user_id))
      };
      let owner_id = owner_id.ok_or_else(|| AppError::Internal("order not loaded before payment".to_string()))?;
      let customer = store
        .get_user(owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", owner_id)))?;
      ctx_data.write().customer = Some(customer);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("build_session_request", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let config = guard.app_state.config.clone();
      let customer = guard
        .customer
        .as_ref()
        .ok_or_else(|| AppError::Internal("customer not loaded before payment".to_string()))?;

      let callback = |kind: &str| format!("{}/api/v1/payment/{}/", config.backend_base_url, kind);
      let request = PaymentSessionRequest {
        total_amount: format_amount(guard.amount_cents),
        currency: config.payment.currency.clone(),
        tran_id: TransactionId::for_order(guard.order_id).to_string(),
        success_url: callback("success"),
        fail_url: callback("fail"),
        cancel_url: callback("cancel"),
        emi_option: 0,
        customer: CustomerInfo {
          name: customer.full_name(),
          email: customer.email.clone(),
          phone: customer.phone_number.clone().unwrap_or_default(),
          address: customer.address.clone().unwrap_or_default(),
          city: DEFAULT_CUSTOMER_CITY.to_string(),
          country: DEFAULT_CUSTOMER_COUNTRY.to_string(),
        },
        shipping_method: SHIPPING_METHOD.to_string(),
        num_of_item: guard.num_items,
        product_name: PRODUCT_NAME.to_string(),
        product_category: PRODUCT_CATEGORY.to_string(),
        product_profile: PRODUCT_PROFILE.to_string(),
      };
      guard.session_request = Some(request);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on("create_hosted_session", |ctx_data: ContextData<InitiatePaymentCtxData>| {
    Box::pin(async move {
      let (gateway, request) = {
        let guard = ctx_data.read();
        let request = guard
          .session_request
          .clone()
          .ok_or_else(|| AppError::Internal("session request not built".to_string()))?;
        (guard.app_state.gateway.clone(), request)
      };
      let session = gateway.create_session(&request).await.map_err(|e| {
        warn!(gateway = gateway.name(), tran_id = %request.tran_id, error = %e, "payment initiation failed");
        AppError::from(e)
      })?;
      info!(gateway = gateway.name(), tran_id = %request.tran_id, "payment session created");
      ctx_data.write().payment_url = Some(session.payment_url);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register(p);
  info!("Initiate payment pipeline registered.");
}
