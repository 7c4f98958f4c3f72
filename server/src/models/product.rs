// src/models/product.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn validate(&self) -> Result<()> {
    if self.price_cents < 0 {
      return Err(AppError::Validation("Price can not be negative".to_string()));
    }
    if self.stock < 0 {
      return Err(AppError::Validation("Stock can not be negative".to_string()));
    }
    Ok(())
  }

  pub fn summary(&self) -> ProductSummary {
    ProductSummary {
      id: self.id,
      name: self.name.clone(),
      price_cents: self.price_cents,
    }
  }
}

/// The slice of a product shown next to a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ProductSummary {
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
}
