// tests/payment_tests.rs
mod common;

use bazaar_server::errors::AppError;
use bazaar_server::models::{CallbackKind, OrderStatus, TransactionId};
use bazaar_server::services::{order_service, payment_service};
use common::*;
use uuid::Uuid;

#[tokio::test]
async fn initiate_returns_gateway_url_and_sends_stored_total() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let bag = app.create_product("Bag", 500).await;
  let detail = app.place_order(alice, &[(&shirt, 2), (&bag, 1)]).await;
  let tran_id = TransactionId::for_order(detail.order.id).to_string();

  let url = payment_service::initiate_payment(&app.state, detail.order.id, Some(2500), None, alice)
    .await
    .unwrap();
  assert_eq!(url, format!("{}/mock-gateway/pay/{}", APP_BASE_URL, tran_id));

  let requests = app.gateway.requests();
  assert_eq!(requests.len(), 1);
  let request = &requests[0];
  assert_eq!(request.tran_id, tran_id);
  assert!(request.tran_id.starts_with("trn_"));
  assert_eq!(request.total_amount, "25.00");
  assert_eq!(request.currency, "BDT");
  assert_eq!(request.num_of_item, 2);
  assert_eq!(request.success_url, format!("{}/api/v1/payment/success/", BACKEND_BASE_URL));
  assert_eq!(request.fail_url, format!("{}/api/v1/payment/fail/", BACKEND_BASE_URL));
  assert_eq!(request.cancel_url, format!("{}/api/v1/payment/cancel/", BACKEND_BASE_URL));
  assert_eq!(request.emi_option, 0);
  assert_eq!(request.shipping_method, "NO");
  assert_eq!(request.product_name, "E-commerce Product");
  assert_eq!(request.customer.name, "Alice Tester");
  assert_eq!(request.customer.city, "Dhaka");
  assert_eq!(request.customer.country, "Bangladesh");

  // Opening a session never moves the order.
  assert_eq!(app.order_status(detail.order.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn initiate_without_client_amount_uses_stored_total() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let mug = app.create_product("Mug", 750).await;
  let detail = app.place_order(alice, &[(&mug, 3)]).await;

  payment_service::initiate_payment(&app.state, detail.order.id, None, Some(3), alice)
    .await
    .unwrap();
  let request = &app.gateway.requests()[0];
  assert_eq!(request.total_amount, "22.50");
  assert_eq!(request.num_of_item, 3);
}

#[tokio::test]
async fn tampered_amount_is_rejected() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;

  let err = payment_service::initiate_payment(&app.state, detail.order.id, Some(100), None, alice)
    .await
    .unwrap_err();
  assert_validation(err);
  assert!(app.gateway.requests().is_empty());
}

#[tokio::test]
async fn only_pending_orders_can_be_paid() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;
  order_service::cancel_order(&app.state, detail.order.id, alice).await.unwrap();

  let err = payment_service::initiate_payment(&app.state, detail.order.id, None, None, alice)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::InvalidStateTransition(_)), "got {:?}", err);
  assert!(app.gateway.requests().is_empty());
}

#[tokio::test]
async fn paying_someone_elses_order_is_forbidden() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let bob = app.create_user("Bob", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;

  let err = payment_service::initiate_payment(&app.state, detail.order.id, None, None, bob)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::PermissionDenied(_)), "got {:?}", err);

  let err = payment_service::initiate_payment(&app.state, Uuid::new_v4(), None, None, alice)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn gateway_failure_leaves_order_pending() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;
  app.gateway.set_failing(true);

  let err = payment_service::initiate_payment(&app.state, detail.order.id, None, None, alice)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::PaymentInitiation(_)), "got {:?}", err);
  assert_eq!(app.gateway.requests().len(), 1);
  assert_eq!(app.order_status(detail.order.id).await, OrderStatus::Pending);

  app.gateway.set_failing(false);
  assert!(payment_service::initiate_payment(&app.state, detail.order.id, None, None, alice)
    .await
    .is_ok());
}

#[tokio::test]
async fn success_callback_marks_order_received_once() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;
  let tran_id = TransactionId::for_order(detail.order.id).to_string();
  let dashboard = format!("{}/dashboard/orders/", FRONTEND_BASE_URL);

  let redirect = payment_service::handle_payment_callback(&app.state, CallbackKind::Success, &tran_id)
    .await
    .unwrap();
  assert_eq!(redirect, dashboard);
  assert_eq!(app.order_status(detail.order.id).await, OrderStatus::Received);

  let redirect = payment_service::handle_payment_callback(&app.state, CallbackKind::Success, &tran_id)
    .await
    .unwrap();
  assert_eq!(redirect, dashboard);
  assert_eq!(app.order_status(detail.order.id).await, OrderStatus::Received);
}

#[tokio::test]
async fn malformed_transaction_id_is_rejected() {
  let app = TestApp::new();

  for raw in ["", "order_123", "trn_not-a-uuid"] {
    let err = payment_service::handle_payment_callback(&app.state, CallbackKind::Success, raw)
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::CallbackParse(_)), "{:?} gave {:?}", raw, err);
  }
}

#[tokio::test]
async fn success_for_unknown_order_is_not_found() {
  let app = TestApp::new();
  let tran_id = TransactionId::for_order(Uuid::new_v4()).to_string();

  let err = payment_service::handle_payment_callback(&app.state, CallbackKind::Success, &tran_id)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn fail_and_cancel_callbacks_only_redirect() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;
  let tran_id = TransactionId::for_order(detail.order.id).to_string();

  for kind in [CallbackKind::Fail, CallbackKind::Cancel] {
    let redirect = payment_service::handle_payment_callback(&app.state, kind, &tran_id).await.unwrap();
    assert_eq!(redirect, format!("{}/dashboard/orders/", FRONTEND_BASE_URL));
  }
  // Missing or garbage ids are tolerated on these paths.
  payment_service::handle_payment_callback(&app.state, CallbackKind::Fail, "")
    .await
    .unwrap();
  assert_eq!(app.order_status(detail.order.id).await, OrderStatus::Pending);
}

#[tokio::test]
async fn success_for_canceled_order_leaves_it_canceled() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;
  order_service::cancel_order(&app.state, detail.order.id, alice).await.unwrap();
  let tran_id = TransactionId::for_order(detail.order.id).to_string();

  payment_service::handle_payment_callback(&app.state, CallbackKind::Success, &tran_id)
    .await
    .unwrap();
  assert_eq!(app.order_status(detail.order.id).await, OrderStatus::Canceled);
}
