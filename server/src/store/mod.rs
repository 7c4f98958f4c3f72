// src/store/mod.rs

//! Persistence behind the order engine.
//!
//! The engine talks to a [`Store`]; `postgres` is the production backend and
//! `memory` backs local runs and the test suite. Both give checkout the same
//! guarantees: [`Store::convert_cart_to_order`] is all-or-nothing and a cart
//! can be converted at most once.

use crate::config::{AppConfig, StoreBackend};
use crate::errors::{AppError, Result};
use crate::models::{
  Cart, CartItem, CartLine, CartSnapshot, NewOrder, Order, OrderDetail, OrderStatus, Product, User,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Turns a cart snapshot into the rows to write. Runs inside the checkout
/// transaction, so an error here aborts the conversion.
pub type OrderPlanner = fn(&CartSnapshot) -> Result<NewOrder>;

#[async_trait]
pub trait Store: Send + Sync {
  // --- catalog & users (read by the engine; written by seeding only) ---
  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;
  async fn upsert_user(&self, user: &User) -> Result<()>;
  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>>;
  async fn upsert_product(&self, product: &Product) -> Result<()>;

  // --- carts ---
  /// Returns the user's cart, creating it when missing. The flag is `true`
  /// when a new cart was created.
  async fn get_or_create_cart(&self, user_id: Uuid) -> Result<(Cart, bool)>;
  async fn get_cart(&self, cart_id: Uuid) -> Result<Option<Cart>>;
  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool>;
  async fn list_cart_lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>>;
  /// Adds `quantity` of a product, incrementing an existing line.
  async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem>;
  async fn get_cart_item(&self, item_id: Uuid) -> Result<Option<CartItem>>;
  async fn set_cart_item_quantity(&self, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;
  async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool>;
  async fn load_cart_with_items_and_prices(&self, cart_id: Uuid) -> Result<Option<CartSnapshot>>;

  // --- orders ---
  /// Locks and re-reads the cart, writes the order planned by `plan` with
  /// its items, and deletes the cart, atomically.
  async fn convert_cart_to_order(&self, cart_id: Uuid, plan: OrderPlanner) -> Result<OrderDetail>;
  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>>;
  async fn get_order_detail(&self, order_id: Uuid) -> Result<Option<OrderDetail>>;
  /// Newest first. `owner` restricts the listing to one user's orders.
  async fn list_orders(&self, owner: Option<Uuid>) -> Result<Vec<OrderDetail>>;
  /// Sets `next` only if the order is still in `expected`. `None` means the
  /// order is missing or its status moved on.
  async fn compare_and_set_status(&self, order_id: Uuid, expected: OrderStatus, next: OrderStatus)
    -> Result<Option<Order>>;
  async fn has_ordered(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
}

/// Opens the backend selected by `STORE_BACKEND`.
pub async fn init_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
  match config.store_backend {
    StoreBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres store".to_string()))?;
      let store = PgStore::connect(url).await?;
      store.migrate().await?;
      info!("Store: postgres (migrations applied)");
      Ok(Arc::new(store))
    }
    StoreBackend::Memory => {
      info!("Store: in-memory");
      Ok(Arc::new(MemoryStore::new()))
    }
  }
}
