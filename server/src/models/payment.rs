// src/models/payment.rs

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const TRANSACTION_PREFIX: &str = "trn_";

pub const PRODUCT_NAME: &str = "E-commerce Product";
pub const PRODUCT_CATEGORY: &str = "General";
pub const PRODUCT_PROFILE: &str = "general";
pub const SHIPPING_METHOD: &str = "NO";
pub const DEFAULT_CUSTOMER_CITY: &str = "Dhaka";
pub const DEFAULT_CUSTOMER_COUNTRY: &str = "Bangladesh";

/// Gateway transaction reference for an order, `trn_<order uuid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionId(Uuid);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionIdError {
  #[error("transaction id is empty")]
  Empty,
  #[error("transaction id '{0}' does not start with 'trn_'")]
  MissingPrefix(String),
  #[error("transaction id '{0}' does not carry a valid order id")]
  InvalidOrderId(String),
}

impl TransactionId {
  pub fn for_order(order_id: Uuid) -> Self {
    TransactionId(order_id)
  }

  pub fn order_id(&self) -> Uuid {
    self.0
  }
}

impl FromStr for TransactionId {
  type Err = TransactionIdError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let raw = raw.trim();
    if raw.is_empty() {
      return Err(TransactionIdError::Empty);
    }
    let id = raw
      .strip_prefix(TRANSACTION_PREFIX)
      .ok_or_else(|| TransactionIdError::MissingPrefix(raw.to_string()))?;
    Uuid::parse_str(id)
      .map(TransactionId)
      .map_err(|_| TransactionIdError::InvalidOrderId(raw.to_string()))
  }
}

impl fmt::Display for TransactionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", TRANSACTION_PREFIX, self.0)
  }
}

/// Which of the gateway's return URLs was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackKind {
  Success,
  Fail,
  Cancel,
}

impl CallbackKind {
  pub fn as_str(self) -> &'static str {
    match self {
      CallbackKind::Success => "success",
      CallbackKind::Fail => "fail",
      CallbackKind::Cancel => "cancel",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
  pub name: String,
  pub email: String,
  pub phone: String,
  pub address: String,
  pub city: String,
  pub country: String,
}

/// Everything a hosted payment session is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSessionRequest {
  /// Decimal amount with two fraction digits, e.g. `25.00`.
  pub total_amount: String,
  pub currency: String,
  pub tran_id: String,
  pub success_url: String,
  pub fail_url: String,
  pub cancel_url: String,
  pub emi_option: u8,
  pub customer: CustomerInfo,
  pub shipping_method: String,
  pub num_of_item: u32,
  pub product_name: String,
  pub product_category: String,
  pub product_profile: String,
}

/// Renders minor units as `major.minor`.
pub fn format_amount(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parses a non-negative decimal amount with at most two fraction digits
/// into minor units. `"25"`, `"25.5"` and `"25.00"` are all accepted.
pub fn parse_amount(raw: &str) -> Option<i64> {
  let raw = raw.trim();
  let (whole, fraction) = match raw.split_once('.') {
    Some((w, f)) => (w, f),
    None => (raw, ""),
  };
  if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let whole: i64 = whole.parse().ok()?;
  let minor = match fraction.len() {
    0 => 0,
    1 => fraction.parse::<i64>().ok()? * 10,
    _ => fraction.parse::<i64>().ok()?,
  };
  whole.checked_mul(100)?.checked_add(minor)
}
