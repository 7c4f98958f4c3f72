// src/models/principal.rs

use serde::Serialize;
use uuid::Uuid;

/// The authenticated actor every cart and order operation is performed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
  pub user_id: Uuid,
  pub is_staff: bool,
}

impl Principal {
  pub fn user(user_id: Uuid) -> Self {
    Self {
      user_id,
      is_staff: false,
    }
  }

  pub fn staff(user_id: Uuid) -> Self {
    Self { user_id, is_staff: true }
  }

  /// Staff may act on anything; everyone else only on what they own.
  pub fn can_access(&self, owner_id: Uuid) -> bool {
    self.is_staff || self.user_id == owner_id
  }
}
