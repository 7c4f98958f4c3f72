// tests/checkout_tests.rs
mod common;

use bazaar_server::errors::AppError;
use bazaar_server::models::OrderStatus;
use bazaar_server::services::{cart_service, order_service};
use bazaar_server::store::Store;
use common::*;
use uuid::Uuid;

#[tokio::test]
async fn checkout_prices_lines_and_consumes_cart() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let bag = app.create_product("Bag", 500).await;

  let cart_id = app.fill_cart(alice, &[(&shirt, 2), (&bag, 1)]).await;
  let detail = order_service::create_order(&app.state, cart_id, alice).await.unwrap();

  assert_eq!(detail.order.user_id, alice.user_id);
  assert_eq!(detail.order.status, OrderStatus::Pending);
  assert_eq!(detail.order.total_price_cents, 2500);
  assert_eq!(detail.items.len(), 2);

  let shirt_line = detail.items.iter().find(|i| i.product_id == shirt.id).unwrap();
  assert_eq!(shirt_line.quantity, 2);
  assert_eq!(shirt_line.price_cents, 1000);
  assert_eq!(shirt_line.total_price_cents, 2000);
  let bag_line = detail.items.iter().find(|i| i.product_id == bag.id).unwrap();
  assert_eq!(bag_line.total_price_cents, 500);

  let line_sum: i64 = detail.items.iter().map(|i| i.total_price_cents).sum();
  assert_eq!(line_sum, detail.order.total_price_cents);

  assert!(app.store.get_cart(cart_id).await.unwrap().is_none());
  assert!(app.store.list_cart_lines(cart_id).await.unwrap().is_empty());
  assert_eq!(app.store.order_count(), 1);
  assert_eq!(app.store.order_item_count(), 2);
}

#[tokio::test]
async fn adding_same_product_twice_merges_the_line() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;

  let cart_id = app.fill_cart(alice, &[(&shirt, 1), (&shirt, 2)]).await;
  let view = cart_service::get_cart(&app.state, cart_id, alice).await.unwrap();
  assert_eq!(view.items.len(), 1);
  assert_eq!(view.items[0].quantity, 3);
  assert_eq!(view.total_price_cents, 3000);
}

#[tokio::test]
async fn empty_cart_is_rejected_without_side_effects() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let cart_id = app.fill_cart(alice, &[]).await;

  let err = order_service::create_order(&app.state, cart_id, alice).await.unwrap_err();
  assert_validation(err);
  assert_eq!(app.store.order_count(), 0);
  assert_eq!(app.store.order_item_count(), 0);
  assert!(app.store.get_cart(cart_id).await.unwrap().is_some());
}

#[tokio::test]
async fn missing_cart_is_not_found() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;

  let shirt = app.create_product("Shirt", 1000).await;
  app.place_order(alice, &[(&shirt, 1)]).await;

  let err = order_service::create_order(&app.state, Uuid::new_v4(), alice).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
  assert_eq!(app.store.order_count(), 1);
  assert_eq!(app.store.order_item_count(), 1);
}

#[tokio::test]
async fn unknown_user_cannot_check_out() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let cart_id = app.fill_cart(alice, &[(&shirt, 1)]).await;

  let ghost = bazaar_server::models::Principal::user(Uuid::new_v4());
  let err = order_service::create_order(&app.state, cart_id, ghost).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
  assert!(app.store.get_cart(cart_id).await.unwrap().is_some());
}

#[tokio::test]
async fn foreign_cart_is_forbidden() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let bob = app.create_user("Bob", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let cart_id = app.fill_cart(alice, &[(&shirt, 1)]).await;

  let err = order_service::create_order(&app.state, cart_id, bob).await.unwrap_err();
  assert!(matches!(err, AppError::PermissionDenied(_)), "got {:?}", err);
  assert_eq!(app.store.order_count(), 0);
  assert_eq!(app.store.list_cart_lines(cart_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn order_keeps_checkout_prices() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;

  let detail = app.place_order(alice, &[(&shirt, 2)]).await;
  app.set_price(&shirt, 4000).await;

  let reloaded = order_service::get_order(&app.state, detail.order.id, alice).await.unwrap();
  assert_eq!(reloaded.order.total_price_cents, 2000);
  assert_eq!(reloaded.items[0].price_cents, 1000);
}

#[tokio::test]
async fn checkout_uses_current_price_at_conversion() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;

  let cart_id = app.fill_cart(alice, &[(&shirt, 1)]).await;
  app.set_price(&shirt, 1250).await;
  let detail = order_service::create_order(&app.state, cart_id, alice).await.unwrap();
  assert_eq!(detail.order.total_price_cents, 1250);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_convert_the_cart_once() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let cart_id = app.fill_cart(alice, &[(&shirt, 1)]).await;

  let attempts: Vec<_> = (0..8)
    .map(|_| {
      let state = app.state.clone();
      tokio::spawn(async move { order_service::create_order(&state, cart_id, alice).await })
    })
    .collect();

  let mut succeeded = 0;
  for attempt in attempts {
    match attempt.await.unwrap() {
      Ok(_) => succeeded += 1,
      Err(err) => assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err),
    }
  }
  assert_eq!(succeeded, 1);
  assert_eq!(app.store.order_count(), 1);
  assert_eq!(app.store.order_item_count(), 1);
}

#[tokio::test]
async fn has_ordered_tracks_purchased_products() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let bob = app.create_user("Bob", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let mug = app.create_product("Mug", 750).await;

  assert!(!order_service::has_ordered(&app.state, alice, shirt.id).await.unwrap());
  app.place_order(alice, &[(&shirt, 1)]).await;

  assert!(order_service::has_ordered(&app.state, alice, shirt.id).await.unwrap());
  assert!(!order_service::has_ordered(&app.state, alice, mug.id).await.unwrap());
  assert!(!order_service::has_ordered(&app.state, bob, shirt.id).await.unwrap());
  assert!(!order_service::has_ordered(&app.state, alice, Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn orders_are_private_to_their_owner() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let bob = app.create_user("Bob", false).await;
  let staff = app.create_user("Sam", true).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let detail = app.place_order(alice, &[(&shirt, 1)]).await;

  let err = order_service::get_order(&app.state, detail.order.id, bob).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
  assert!(order_service::get_order(&app.state, detail.order.id, staff).await.is_ok());

  assert_eq!(order_service::list_orders(&app.state, alice).await.unwrap().len(), 1);
  assert!(order_service::list_orders(&app.state, bob).await.unwrap().is_empty());
  assert_eq!(order_service::list_orders(&app.state, staff).await.unwrap().len(), 1);
}

#[tokio::test]
async fn cart_quantity_must_be_positive() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let cart_id = app.fill_cart(alice, &[]).await;

  let err = cart_service::add_item(&app.state, cart_id, shirt.id, 0, alice).await.unwrap_err();
  assert_validation(err);
  let err = cart_service::add_item(&app.state, cart_id, Uuid::new_v4(), 1, alice).await.unwrap_err();
  assert_validation(err);
}

#[tokio::test]
async fn demo_seed_is_repeatable_and_orderable() {
  use bazaar_server::models::Principal;
  use bazaar_server::services::seed::{seed_demo_data, DEMO_CUSTOMER_ID, DEMO_STAFF_ID};

  let app = TestApp::new();
  seed_demo_data(app.store.as_ref()).await.unwrap();
  seed_demo_data(app.store.as_ref()).await.unwrap();

  let staff = app.store.get_user(DEMO_STAFF_ID).await.unwrap().unwrap();
  assert!(staff.is_staff);

  let customer = Principal::user(DEMO_CUSTOMER_ID);
  let product_id = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0101);
  let product = app.store.get_product(product_id).await.unwrap().unwrap();
  let detail = app.place_order(customer, &[(&product, 1)]).await;
  assert_eq!(detail.order.total_price_cents, product.price_cents);
}

#[tokio::test]
async fn cart_view_total_out_of_range_is_rejected() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let pricey = app.create_product("Pricey", i64::MAX / 2).await;
  let cart_id = app.fill_cart(alice, &[(&pricey, 3)]).await;

  let err = cart_service::get_cart(&app.state, cart_id, alice).await.unwrap_err();
  assert_validation(err);
}

#[tokio::test]
async fn cart_view_total_spanning_lines_is_rejected() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let first = app.create_product("First", i64::MAX / 2 + 1).await;
  let second = app.create_product("Second", i64::MAX / 2 + 1).await;
  let cart_id = app.fill_cart(alice, &[(&first, 1), (&second, 1)]).await;

  let err = cart_service::get_cart(&app.state, cart_id, alice).await.unwrap_err();
  assert_validation(err);
}

#[tokio::test]
async fn adding_to_a_consumed_cart_is_not_found() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1000).await;
  let cart_id = app.fill_cart(alice, &[(&shirt, 1)]).await;
  assert!(app.store.delete_cart(cart_id).await.unwrap());

  let err = app.store.add_cart_item(cart_id, shirt.id, 1).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn cart_line_quantity_overflow_is_validation() {
  let app = TestApp::new();
  let alice = app.create_user("Alice", false).await;
  let shirt = app.create_product("Shirt", 1).await;
  let cart_id = app.fill_cart(alice, &[(&shirt, i32::MAX)]).await;

  let err = app.store.add_cart_item(cart_id, shirt.id, 1).await.unwrap_err();
  assert_validation(err);
}
