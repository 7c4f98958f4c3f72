// src/services/payment_mock.rs

use crate::models::PaymentSessionRequest;
use crate::services::payment_gateway::{GatewayError, HostedSession, PaymentGateway};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument};

/// Offline gateway for local runs and tests. Records every session request
/// and can be switched into a failing mode.
pub struct MockGateway {
  base_url: String,
  failing: AtomicBool,
  requests: Mutex<Vec<PaymentSessionRequest>>,
}

impl MockGateway {
  pub fn new(app_base_url: &str) -> Self {
    Self {
      base_url: app_base_url.trim_end_matches('/').to_string(),
      failing: AtomicBool::new(false),
      requests: Mutex::new(Vec::new()),
    }
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn requests(&self) -> Vec<PaymentSessionRequest> {
    self.requests.lock().clone()
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  fn name(&self) -> &'static str {
    "mock"
  }

  #[instrument(name = "MockGateway::create_session", skip_all, fields(tran_id = %request.tran_id))]
  async fn create_session(&self, request: &PaymentSessionRequest) -> Result<HostedSession, GatewayError> {
    self.requests.lock().push(request.clone());
    if self.failing.load(Ordering::SeqCst) {
      info!("mock gateway refusing session");
      return Err(GatewayError::Rejected("mock gateway is set to fail".to_string()));
    }
    Ok(HostedSession {
      payment_url: format!("{}/mock-gateway/pay/{}", self.base_url, request.tran_id),
    })
  }
}
