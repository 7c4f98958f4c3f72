// src/services/seed.rs

//! Demo users and products for local development (`SEED_DB=true`).

use crate::errors::Result as AppResult;
use crate::models::{Product, User};
use crate::store::Store;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub const DEMO_CUSTOMER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
pub const DEMO_STAFF_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002);

const DEMO_PRODUCTS: &[(u128, &str, i64, i32)] = &[
  (0x0000_0000_0000_4000_8000_0000_0000_0101, "Cotton T-Shirt", 1000, 50),
  (0x0000_0000_0000_4000_8000_0000_0000_0102, "Canvas Tote Bag", 500, 120),
  (0x0000_0000_0000_4000_8000_0000_0000_0103, "Ceramic Mug", 750, 40),
];

/// Idempotent: re-running overwrites the same rows.
pub async fn seed_demo_data(store: &dyn Store) -> AppResult<()> {
  let now = Utc::now();
  let users = [
    User {
      id: DEMO_CUSTOMER_ID,
      email: "customer@example.com".to_string(),
      first_name: "Demo".to_string(),
      last_name: "Customer".to_string(),
      phone_number: Some("01700000000".to_string()),
      address: Some("House 1, Road 1".to_string()),
      is_staff: false,
      created_at: now,
    },
    User {
      id: DEMO_STAFF_ID,
      email: "staff@example.com".to_string(),
      first_name: "Demo".to_string(),
      last_name: "Staff".to_string(),
      phone_number: None,
      address: None,
      is_staff: true,
      created_at: now,
    },
  ];
  for user in &users {
    store.upsert_user(user).await?;
  }

  for (id, name, price_cents, stock) in DEMO_PRODUCTS {
    store
      .upsert_product(&Product {
        id: Uuid::from_u128(*id),
        name: name.to_string(),
        description: None,
        price_cents: *price_cents,
        stock: *stock,
        created_at: now,
        updated_at: now,
      })
      .await?;
  }

  info!(users = users.len(), products = DEMO_PRODUCTS.len(), "demo data seeded");
  Ok(())
}
