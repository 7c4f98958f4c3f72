// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account record owned by the identity service; read here for ownership
/// checks and payment contact details.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone_number: Option<String>,
  pub address: Option<String>,
  pub is_staff: bool,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn full_name(&self) -> String {
    let name = format!("{} {}", self.first_name, self.last_name);
    let name = name.trim();
    if name.is_empty() {
      self.email.clone()
    } else {
      name.to_string()
    }
  }
}
