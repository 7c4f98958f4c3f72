// src/web/extractors.rs

use crate::errors::AppError;
use actix_web::{FromRequest, HttpRequest};
use tracing::warn;
use uuid::Uuid;

pub use crate::models::Principal;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Identity is asserted by the authentication proxy in front of this service
/// through `X-User-ID` and, for staff, `X-User-Role: staff|admin`.
impl FromRequest for Principal {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    futures_util::future::ready(principal_from_request(req))
  }
}

fn principal_from_request(req: &HttpRequest) -> Result<Principal, AppError> {
  let user_id = req
    .headers()
    .get(USER_ID_HEADER)
    .and_then(|value| value.to_str().ok())
    .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    .ok_or_else(|| {
      warn!("Principal extractor: missing or invalid X-User-ID header.");
      AppError::Auth("Authentication required. Missing or invalid X-User-ID header.".to_string())
    })?;

  let is_staff = req
    .headers()
    .get(USER_ROLE_HEADER)
    .and_then(|value| value.to_str().ok())
    .map(|role| matches!(role.trim().to_ascii_lowercase().as_str(), "staff" | "admin"))
    .unwrap_or(false);

  Ok(Principal { user_id, is_staff })
}
