// src/models/cart.rs

use super::cart_item::CartItem;
use super::product::ProductSummary;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A user's in-progress cart. At most one per user; removed when checked out.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cart {
  pub id: Uuid,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
}

/// A cart item joined with the product it points at.
#[derive(Debug, Clone)]
pub struct CartLine {
  pub item: CartItem,
  pub product: ProductSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
  pub id: Uuid,
  pub product: ProductSummary,
  pub quantity: i32,
  pub total_price_cents: i64,
}

/// Cart as shown to its owner, priced from the live catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
  pub id: Uuid,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub items: Vec<CartLineView>,
  pub total_price_cents: i64,
}

impl CartView {
  /// Fails with `Validation` when a line or the cart total leaves the `i64` range.
  pub fn from_lines(cart: Cart, lines: Vec<CartLine>) -> Result<Self> {
    let out_of_range = || AppError::Validation("cart total is out of range".to_string());
    let mut items = Vec::with_capacity(lines.len());
    let mut total_price_cents: i64 = 0;
    for line in lines {
      let line_total = line
        .product
        .price_cents
        .checked_mul(i64::from(line.item.quantity))
        .ok_or_else(out_of_range)?;
      total_price_cents = total_price_cents.checked_add(line_total).ok_or_else(out_of_range)?;
      items.push(CartLineView {
        id: line.item.id,
        total_price_cents: line_total,
        quantity: line.item.quantity,
        product: line.product,
      });
    }
    Ok(CartView {
      id: cart.id,
      user_id: cart.user_id,
      created_at: cart.created_at,
      items,
      total_price_cents,
    })
  }
}

/// A cart line with its unit price resolved at read time.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SnapshotLine {
  pub cart_item_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

/// Everything checkout needs to know about a cart, read in one go.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
  pub cart_id: Uuid,
  pub user_id: Uuid,
  pub lines: Vec<SnapshotLine>,
}

impl CartSnapshot {
  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}
