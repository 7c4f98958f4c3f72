// src/store/memory.rs

use super::{OrderPlanner, Store};
use crate::errors::{AppError, Result};
use crate::models::{
  Cart, CartItem, CartLine, CartSnapshot, Order, OrderDetail, OrderItem, OrderStatus, Product, SnapshotLine, User,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  products: HashMap<Uuid, Product>,
  carts: HashMap<Uuid, Cart>,
  // Vecs keep insertion order, which is the listing order.
  cart_items: Vec<CartItem>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
}

impl Tables {
  /// Cart lines always point at a stored product; a dangling one is a broken table.
  fn product_of(&self, item: &CartItem) -> Result<&Product> {
    self.products.get(&item.product_id).ok_or_else(|| {
      AppError::Internal(format!(
        "cart item {} references missing product {}",
        item.id, item.product_id
      ))
    })
  }

  fn snapshot(&self, cart_id: Uuid) -> Result<Option<CartSnapshot>> {
    let Some(cart) = self.carts.get(&cart_id) else {
      return Ok(None);
    };
    let lines = self
      .cart_items
      .iter()
      .filter(|item| item.cart_id == cart_id)
      .map(|item| {
        self.product_of(item).map(|product| SnapshotLine {
          cart_item_id: item.id,
          product_id: item.product_id,
          quantity: item.quantity,
          unit_price_cents: product.price_cents,
        })
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(Some(CartSnapshot {
      cart_id: cart.id,
      user_id: cart.user_id,
      lines,
    }))
  }

  fn detail(&self, order: &Order) -> OrderDetail {
    OrderDetail {
      order: order.clone(),
      items: self
        .order_items
        .iter()
        .filter(|item| item.order_id == order.id)
        .cloned()
        .collect(),
    }
  }

  fn remove_cart(&mut self, cart_id: Uuid) -> bool {
    let existed = self.carts.remove(&cart_id).is_some();
    self.cart_items.retain(|item| item.cart_id != cart_id);
    existed
  }
}

/// Process-local store. Every operation runs under one lock, so checkout is
/// trivially atomic.
#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn order_count(&self) -> usize {
    self.tables.lock().orders.len()
  }

  pub fn order_item_count(&self) -> usize {
    self.tables.lock().order_items.len()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.lock().users.get(&user_id).cloned())
  }

  async fn upsert_user(&self, user: &User) -> Result<()> {
    let mut tables = self.tables.lock();
    if tables.users.values().any(|u| u.email == user.email && u.id != user.id) {
      return Err(AppError::Validation(format!("Email {} is already in use", user.email)));
    }
    tables.users.insert(user.id, user.clone());
    Ok(())
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.get(&product_id).cloned())
  }

  async fn upsert_product(&self, product: &Product) -> Result<()> {
    product.validate()?;
    self.tables.lock().products.insert(product.id, product.clone());
    Ok(())
  }

  async fn get_or_create_cart(&self, user_id: Uuid) -> Result<(Cart, bool)> {
    let mut tables = self.tables.lock();
    if let Some(existing) = tables.carts.values().find(|c| c.user_id == user_id) {
      return Ok((existing.clone(), false));
    }
    let cart = Cart {
      id: Uuid::new_v4(),
      user_id,
      created_at: Utc::now(),
    };
    tables.carts.insert(cart.id, cart.clone());
    Ok((cart, true))
  }

  async fn get_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    Ok(self.tables.lock().carts.get(&cart_id).cloned())
  }

  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool> {
    Ok(self.tables.lock().remove_cart(cart_id))
  }

  async fn list_cart_lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>> {
    let tables = self.tables.lock();
    let lines = tables
      .cart_items
      .iter()
      .filter(|item| item.cart_id == cart_id)
      .map(|item| {
        tables.product_of(item).map(|product| CartLine {
          item: item.clone(),
          product: product.summary(),
        })
      })
      .collect::<Result<Vec<_>>>()?;
    Ok(lines)
  }

  async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let mut tables = self.tables.lock();
    if !tables.carts.contains_key(&cart_id) {
      return Err(AppError::NotFound(format!("Cart {} not found", cart_id)));
    }
    if !tables.products.contains_key(&product_id) {
      return Err(AppError::Validation(format!("Product with id {} does not exist", product_id)));
    }
    if let Some(existing) = tables
      .cart_items
      .iter_mut()
      .find(|item| item.cart_id == cart_id && item.product_id == product_id)
    {
      existing.quantity = existing
        .quantity
        .checked_add(quantity)
        .ok_or_else(|| AppError::Validation("Quantity is out of range".to_string()))?;
      return Ok(existing.clone());
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      cart_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    };
    tables.cart_items.push(item.clone());
    Ok(item)
  }

  async fn get_cart_item(&self, item_id: Uuid) -> Result<Option<CartItem>> {
    Ok(self.tables.lock().cart_items.iter().find(|item| item.id == item_id).cloned())
  }

  async fn set_cart_item_quantity(&self, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let mut tables = self.tables.lock();
    Ok(tables.cart_items.iter_mut().find(|item| item.id == item_id).map(|item| {
      item.quantity = quantity;
      item.clone()
    }))
  }

  async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let before = tables.cart_items.len();
    tables.cart_items.retain(|item| item.id != item_id);
    Ok(tables.cart_items.len() != before)
  }

  async fn load_cart_with_items_and_prices(&self, cart_id: Uuid) -> Result<Option<CartSnapshot>> {
    self.tables.lock().snapshot(cart_id)
  }

  async fn convert_cart_to_order(&self, cart_id: Uuid, plan: OrderPlanner) -> Result<OrderDetail> {
    let mut tables = self.tables.lock();
    let snapshot = tables
      .snapshot(cart_id)?
      .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;
    // Nothing has been written yet, so a planning error leaves the tables untouched.
    let new_order = plan(&snapshot)?;

    tables.orders.push(new_order.order.clone());
    tables.order_items.extend(new_order.items.iter().cloned());
    tables.remove_cart(cart_id);
    info!(order_id = %new_order.order.id, total_price_cents = new_order.order.total_price_cents, "cart converted to order");

    Ok(new_order.into_detail())
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.iter().find(|o| o.id == order_id).cloned())
  }

  async fn get_order_detail(&self, order_id: Uuid) -> Result<Option<OrderDetail>> {
    let tables = self.tables.lock();
    Ok(tables.orders.iter().find(|o| o.id == order_id).map(|o| tables.detail(o)))
  }

  async fn list_orders(&self, owner: Option<Uuid>) -> Result<Vec<OrderDetail>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .orders
        .iter()
        .rev()
        .filter(|o| owner.map_or(true, |user_id| o.user_id == user_id))
        .map(|o| tables.detail(o))
        .collect(),
    )
  }

  async fn compare_and_set_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
  ) -> Result<Option<Order>> {
    let mut tables = self.tables.lock();
    Ok(
      tables
        .orders
        .iter_mut()
        .find(|o| o.id == order_id && o.status == expected)
        .map(|order| {
          order.status = next;
          order.updated_at = Utc::now();
          order.clone()
        }),
    )
  }

  async fn has_ordered(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let tables = self.tables.lock();
    Ok(tables.order_items.iter().any(|item| {
      item.product_id == product_id && tables.orders.iter().any(|o| o.id == item.order_id && o.user_id == user_id)
    }))
  }
}
