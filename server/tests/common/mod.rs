// tests/common/mod.rs
#![allow(dead_code)]

use bazaar_server::config::AppConfig;
use bazaar_server::errors::AppError;
use bazaar_server::models::{OrderDetail, OrderStatus, Principal, Product, User};
use bazaar_server::services::{cart_service, order_service};
use bazaar_server::services::payment_mock::MockGateway;
use bazaar_server::state::AppState;
use bazaar_server::store::{MemoryStore, Store};
use chrono::Utc;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const APP_BASE_URL: &str = "http://app.test";
pub const BACKEND_BASE_URL: &str = "http://api.test";
pub const FRONTEND_BASE_URL: &str = "http://shop.test";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn test_config() -> AppConfig {
  let vars: HashMap<&str, &str> = HashMap::from([
    ("STORE_BACKEND", "memory"),
    ("PAYMENT_PROVIDER", "mock"),
    ("PAYMENT_CURRENCY", "BDT"),
    ("APP_BASE_URL", APP_BASE_URL),
    ("BACKEND_BASE_URL", BACKEND_BASE_URL),
    ("FRONTEND_BASE_URL", FRONTEND_BASE_URL),
  ]);
  match AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())) {
    Ok(config) => config,
    Err(e) => panic!("test config should load: {}", e),
  }
}

/// An application over the in-memory store and the mock gateway. The
/// concrete handles are kept so tests can inspect and steer them.
pub struct TestApp {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub gateway: Arc<MockGateway>,
}

impl TestApp {
  pub fn new() -> Self {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new(APP_BASE_URL));
    let state = AppState::new(test_config(), store.clone(), gateway.clone());
    Self { state, store, gateway }
  }

  pub async fn create_user(&self, first_name: &str, is_staff: bool) -> Principal {
    let id = Uuid::new_v4();
    let user = User {
      id,
      email: format!("{}-{}@example.com", first_name.to_lowercase(), id.simple()),
      first_name: first_name.to_string(),
      last_name: "Tester".to_string(),
      phone_number: Some("01711111111".to_string()),
      address: Some("12 Lake Road".to_string()),
      is_staff,
      created_at: Utc::now(),
    };
    self.store.upsert_user(&user).await.expect("user should be stored");
    if is_staff {
      Principal::staff(id)
    } else {
      Principal::user(id)
    }
  }

  pub async fn create_product(&self, name: &str, price_cents: i64) -> Product {
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: name.to_string(),
      description: None,
      price_cents,
      stock: 100,
      created_at: now,
      updated_at: now,
    };
    self.store.upsert_product(&product).await.expect("product should be stored");
    product
  }

  pub async fn set_price(&self, product: &Product, price_cents: i64) {
    let mut updated = product.clone();
    updated.price_cents = price_cents;
    updated.updated_at = Utc::now();
    self.store.upsert_product(&updated).await.expect("price update should succeed");
  }

  /// Creates (or reuses) the user's cart and adds each `(product, quantity)`.
  pub async fn fill_cart(&self, principal: Principal, lines: &[(&Product, i32)]) -> Uuid {
    let (cart, _) = cart_service::get_or_create_cart(&self.state, principal)
      .await
      .expect("cart should be created");
    for (product, quantity) in lines {
      cart_service::add_item(&self.state, cart.id, product.id, *quantity, principal)
        .await
        .expect("item should be added");
    }
    cart.id
  }

  pub async fn place_order(&self, principal: Principal, lines: &[(&Product, i32)]) -> OrderDetail {
    let cart_id = self.fill_cart(principal, lines).await;
    order_service::create_order(&self.state, cart_id, principal)
      .await
      .expect("checkout should succeed")
  }

  pub async fn order_status(&self, order_id: Uuid) -> OrderStatus {
    self
      .store
      .get_order(order_id)
      .await
      .expect("store read should succeed")
      .expect("order should exist")
      .status
  }

  /// Forces a status through the store, bypassing the transition rules.
  pub async fn force_status(&self, order_id: Uuid, next: OrderStatus) {
    let current = self.order_status(order_id).await;
    self
      .store
      .compare_and_set_status(order_id, current, next)
      .await
      .expect("store write should succeed")
      .expect("status should be set");
  }
}

pub fn assert_validation(err: AppError) {
  assert!(matches!(err, AppError::Validation(_)), "expected Validation, got {:?}", err);
}
