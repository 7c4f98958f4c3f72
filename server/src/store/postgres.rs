// src/store/postgres.rs

use super::{OrderPlanner, Store};
use crate::errors::{AppError, Result};
use crate::models::{
  Cart, CartItem, CartLine, CartSnapshot, Order, OrderDetail, OrderItem, OrderStatus, Product, ProductSummary,
  SnapshotLine, User,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, status, total_price_cents, created_at, updated_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price_cents, total_price_cents";
const CART_ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, added_at";

// SQLSTATE codes.
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Maps constraint failures of a cart line write onto the errors the
/// in-memory store reports for the same situation.
fn cart_item_write_error(err: sqlx::Error, cart_id: Uuid, product_id: Uuid) -> AppError {
  if let Some(db_err) = err.as_database_error() {
    match (db_err.code().as_deref(), db_err.constraint()) {
      (Some(FOREIGN_KEY_VIOLATION), Some("cart_items_cart_id_fkey")) => {
        return AppError::NotFound(format!("Cart {} not found", cart_id));
      }
      (Some(FOREIGN_KEY_VIOLATION), Some("cart_items_product_id_fkey")) => {
        return AppError::Validation(format!("Product with id {} does not exist", product_id));
      }
      (Some(NUMERIC_VALUE_OUT_OF_RANGE), _) => {
        return AppError::Validation("Quantity is out of range".to_string());
      }
      _ => {}
    }
  }
  AppError::Sqlx(err)
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    info!("Successfully connected to the database.");
    Ok(Self { pool })
  }

  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations")
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Internal(format!("migration failed: {}", e)))
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  async fn snapshot_in(tx: &mut Transaction<'_, Postgres>, cart_id: Uuid, lock: bool) -> Result<Option<CartSnapshot>> {
    let cart_sql = if lock {
      "SELECT id, user_id, created_at FROM carts WHERE id = $1 FOR UPDATE"
    } else {
      "SELECT id, user_id, created_at FROM carts WHERE id = $1"
    };
    let cart: Option<Cart> = sqlx::query_as(cart_sql).bind(cart_id).fetch_optional(&mut **tx).await?;
    let Some(cart) = cart else {
      return Ok(None);
    };

    let lines: Vec<SnapshotLine> = sqlx::query_as(
      "SELECT ci.id AS cart_item_id, ci.product_id, ci.quantity, p.price_cents AS unit_price_cents
       FROM cart_items ci
       JOIN products p ON p.id = ci.product_id
       WHERE ci.cart_id = $1
       ORDER BY ci.added_at, ci.id",
    )
    .bind(cart_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(Some(CartSnapshot {
      cart_id: cart.id,
      user_id: cart.user_id,
      lines,
    }))
  }

  async fn items_for(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>> {
    let items: Vec<OrderItem> = sqlx::query_as(&format!(
      "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, id",
      ORDER_ITEM_COLUMNS
    ))
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
      grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
  }
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
  id: Uuid,
  cart_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  added_at: chrono::DateTime<chrono::Utc>,
  product_name: String,
  product_price_cents: i64,
}

impl From<CartLineRow> for CartLine {
  fn from(row: CartLineRow) -> Self {
    CartLine {
      product: ProductSummary {
        id: row.product_id,
        name: row.product_name,
        price_cents: row.product_price_cents,
      },
      item: CartItem {
        id: row.id,
        cart_id: row.cart_id,
        product_id: row.product_id,
        quantity: row.quantity,
        added_at: row.added_at,
      },
    }
  }
}

#[async_trait]
impl Store for PgStore {
  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as(
      "SELECT id, email, first_name, last_name, phone_number, address, is_staff, created_at
       FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn upsert_user(&self, user: &User) -> Result<()> {
    sqlx::query(
      "INSERT INTO users (id, email, first_name, last_name, phone_number, address, is_staff, created_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
       ON CONFLICT (id) DO UPDATE
       SET email = EXCLUDED.email, first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name,
           phone_number = EXCLUDED.phone_number, address = EXCLUDED.address, is_staff = EXCLUDED.is_staff",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone_number)
    .bind(&user.address)
    .bind(user.is_staff)
    .bind(user.created_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as(
      "SELECT id, name, description, price_cents, stock, created_at, updated_at FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(product)
  }

  async fn upsert_product(&self, product: &Product) -> Result<()> {
    product.validate()?;
    sqlx::query(
      "INSERT INTO products (id, name, description, price_cents, stock, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7)
       ON CONFLICT (id) DO UPDATE
       SET name = EXCLUDED.name, description = EXCLUDED.description, price_cents = EXCLUDED.price_cents,
           stock = EXCLUDED.stock, updated_at = EXCLUDED.updated_at",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn get_or_create_cart(&self, user_id: Uuid) -> Result<(Cart, bool)> {
    // The existing cart can be checked out between the insert and the
    // select; one more round then creates a fresh one.
    for _ in 0..2 {
      let created: Option<Cart> = sqlx::query_as(
        "INSERT INTO carts (id, user_id, created_at) VALUES ($1, $2, NOW())
         ON CONFLICT (user_id) DO NOTHING
         RETURNING id, user_id, created_at",
      )
      .bind(Uuid::new_v4())
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;
      if let Some(cart) = created {
        return Ok((cart, true));
      }

      let existing: Option<Cart> = sqlx::query_as("SELECT id, user_id, created_at FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
      if let Some(cart) = existing {
        return Ok((cart, false));
      }
      debug!(user_id = %user_id, "cart vanished between insert and select; retrying");
    }
    Err(AppError::Internal(format!(
      "could not create or load a cart for user {}",
      user_id
    )))
  }

  async fn get_cart(&self, cart_id: Uuid) -> Result<Option<Cart>> {
    let cart = sqlx::query_as("SELECT id, user_id, created_at FROM carts WHERE id = $1")
      .bind(cart_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(cart)
  }

  async fn delete_cart(&self, cart_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(cart_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_cart_lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>> {
    let rows: Vec<CartLineRow> = sqlx::query_as(
      "SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity, ci.added_at,
              p.name AS product_name, p.price_cents AS product_price_cents
       FROM cart_items ci
       JOIN products p ON p.id = ci.product_id
       WHERE ci.cart_id = $1
       ORDER BY ci.added_at, ci.id",
    )
    .bind(cart_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows.into_iter().map(CartLine::from).collect())
  }

  async fn add_cart_item(&self, cart_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let item = sqlx::query_as(&format!(
      "INSERT INTO cart_items (id, cart_id, product_id, quantity, added_at)
       VALUES ($1, $2, $3, $4, NOW())
       ON CONFLICT (cart_id, product_id) DO UPDATE
       SET quantity = cart_items.quantity + EXCLUDED.quantity
       RETURNING {}",
      CART_ITEM_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| cart_item_write_error(e, cart_id, product_id))?;
    Ok(item)
  }

  async fn get_cart_item(&self, item_id: Uuid) -> Result<Option<CartItem>> {
    let item = sqlx::query_as(&format!("SELECT {} FROM cart_items WHERE id = $1", CART_ITEM_COLUMNS))
      .bind(item_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(item)
  }

  async fn set_cart_item_quantity(&self, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let item = sqlx::query_as(&format!(
      "UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING {}",
      CART_ITEM_COLUMNS
    ))
    .bind(item_id)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await?;
    Ok(item)
  }

  async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
      .bind(item_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn load_cart_with_items_and_prices(&self, cart_id: Uuid) -> Result<Option<CartSnapshot>> {
    let mut tx = self.pool.begin().await?;
    let snapshot = Self::snapshot_in(&mut tx, cart_id, false).await?;
    tx.commit().await?;
    Ok(snapshot)
  }

  #[instrument(name = "PgStore::convert_cart_to_order", skip(self, plan), fields(cart_id = %cart_id))]
  async fn convert_cart_to_order(&self, cart_id: Uuid, plan: OrderPlanner) -> Result<OrderDetail> {
    // Dropping `tx` on any early return rolls the whole conversion back.
    let mut tx = self.pool.begin().await?;

    let snapshot = Self::snapshot_in(&mut tx, cart_id, true)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Cart {} not found", cart_id)))?;
    let new_order = plan(&snapshot)?;

    let order: Order = sqlx::query_as(&format!(
      "INSERT INTO orders (id, user_id, status, total_price_cents, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6)
       RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(new_order.order.id)
    .bind(new_order.order.user_id)
    .bind(new_order.order.status)
    .bind(new_order.order.total_price_cents)
    .bind(new_order.order.created_at)
    .bind(new_order.order.updated_at)
    .fetch_one(&mut *tx)
    .await?;

    let ids: Vec<Uuid> = new_order.items.iter().map(|i| i.id).collect();
    let order_ids: Vec<Uuid> = new_order.items.iter().map(|i| i.order_id).collect();
    let product_ids: Vec<Uuid> = new_order.items.iter().map(|i| i.product_id).collect();
    let quantities: Vec<i32> = new_order.items.iter().map(|i| i.quantity).collect();
    let prices: Vec<i64> = new_order.items.iter().map(|i| i.price_cents).collect();
    let totals: Vec<i64> = new_order.items.iter().map(|i| i.total_price_cents).collect();
    let inserted = sqlx::query(
      "INSERT INTO order_items (id, order_id, product_id, quantity, price_cents, total_price_cents)
       SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::int4[], $5::int8[], $6::int8[])",
    )
    .bind(&ids)
    .bind(&order_ids)
    .bind(&product_ids)
    .bind(&quantities)
    .bind(&prices)
    .bind(&totals)
    .execute(&mut *tx)
    .await?;
    debug!(order_id = %order.id, items = inserted.rows_affected(), "order items written");

    sqlx::query("DELETE FROM carts WHERE id = $1")
      .bind(cart_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    info!(order_id = %order.id, total_price_cents = order.total_price_cents, "cart converted to order");

    Ok(OrderDetail {
      order,
      items: new_order.items,
    })
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn get_order_detail(&self, order_id: Uuid) -> Result<Option<OrderDetail>> {
    let Some(order) = self.get_order(order_id).await? else {
      return Ok(None);
    };
    let items = self.items_for(&[order.id]).await?.remove(&order.id).unwrap_or_default();
    Ok(Some(OrderDetail { order, items }))
  }

  async fn list_orders(&self, owner: Option<Uuid>) -> Result<Vec<OrderDetail>> {
    let orders: Vec<Order> = match owner {
      Some(user_id) => {
        sqlx::query_as(&format!(
          "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
          ORDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
      }
      None => {
        sqlx::query_as(&format!("SELECT {} FROM orders ORDER BY created_at DESC, id", ORDER_COLUMNS))
          .fetch_all(&self.pool)
          .await?
      }
    };

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items = self.items_for(&ids).await?;
    Ok(
      orders
        .into_iter()
        .map(|order| OrderDetail {
          items: items.remove(&order.id).unwrap_or_default(),
          order,
        })
        .collect(),
    )
  }

  async fn compare_and_set_status(
    &self,
    order_id: Uuid,
    expected: OrderStatus,
    next: OrderStatus,
  ) -> Result<Option<Order>> {
    let order = sqlx::query_as(&format!(
      "UPDATE orders SET status = $3, updated_at = NOW()
       WHERE id = $1 AND status = $2
       RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(expected)
    .bind(next)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn has_ordered(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
      "SELECT EXISTS (
         SELECT 1 FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE o.user_id = $1 AND oi.product_id = $2
       )",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(&self.pool)
    .await?;
    Ok(exists)
  }
}
