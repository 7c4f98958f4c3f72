// src/models/order.rs

use super::cart::CartSnapshot;
use super::order_item::OrderItem;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  /// Paid through the gateway.
  Received,
  Delivered,
  Canceled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Received => "received",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Canceled => "canceled",
    }
  }

  /// Whether moving from `self` to `next` is a real transition. Staying in
  /// the same status is not one; callers treat it as a no-op.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Pending, Received) | (Pending, Canceled) | (Received, Delivered) | (Received, Canceled)
    )
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub total_price_cents: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
}

/// The rows checkout writes for one cart, computed before anything is stored.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub order: Order,
  pub items: Vec<OrderItem>,
}

impl NewOrder {
  /// Prices every line at its snapshot unit price and totals the order.
  pub fn from_snapshot(snapshot: &CartSnapshot) -> Result<NewOrder> {
    if snapshot.is_empty() {
      return Err(AppError::Validation("cart is empty".to_string()));
    }

    let order_id = Uuid::new_v4();
    let mut items = Vec::with_capacity(snapshot.lines.len());
    let mut total_price_cents: i64 = 0;
    for line in &snapshot.lines {
      if line.unit_price_cents < 0 {
        return Err(AppError::Validation(format!(
          "Product {} has a negative price",
          line.product_id
        )));
      }
      if line.quantity <= 0 {
        return Err(AppError::Validation(format!(
          "Cart item {} has a non-positive quantity",
          line.cart_item_id
        )));
      }
      let line_total = line
        .unit_price_cents
        .checked_mul(i64::from(line.quantity))
        .and_then(|t| total_price_cents.checked_add(t).map(|sum| (t, sum)));
      let (line_total, running) =
        line_total.ok_or_else(|| AppError::Validation("order total is out of range".to_string()))?;
      total_price_cents = running;

      items.push(OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: line.product_id,
        quantity: line.quantity,
        price_cents: line.unit_price_cents,
        total_price_cents: line_total,
      });
    }

    let now = Utc::now();
    Ok(NewOrder {
      order: Order {
        id: order_id,
        user_id: snapshot.user_id,
        status: OrderStatus::Pending,
        total_price_cents,
        created_at: now,
        updated_at: now,
      },
      items,
    })
  }

  pub fn into_detail(self) -> OrderDetail {
    OrderDetail {
      order: self.order,
      items: self.items,
    }
  }
}
