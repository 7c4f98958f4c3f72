// src/services/payment_gateway.rs

//! Hosted payment session providers.

use crate::config::{AppConfig, PaymentConfig, PaymentProvider};
use crate::errors::{AppError, Result as AppResult};
use crate::models::PaymentSessionRequest;
use crate::services::payment_mock::MockGateway;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const SANDBOX_SESSION_URL: &str = "https://sandbox.sslcommerz.com/gwprocess/v4/api.php";
const LIVE_SESSION_URL: &str = "https://securepay.sslcommerz.com/gwprocess/v4/api.php";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),
  #[error("gateway answered HTTP {0}")]
  HttpStatus(u16),
  #[error("gateway rejected the session: {0}")]
  Rejected(String),
  #[error("malformed gateway response: {0}")]
  Malformed(String),
}

impl From<GatewayError> for AppError {
  fn from(err: GatewayError) -> Self {
    AppError::PaymentInitiation(err.to_string())
  }
}

/// An opened hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedSession {
  pub payment_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &'static str;

  async fn create_session(&self, request: &PaymentSessionRequest) -> Result<HostedSession, GatewayError>;
}

/// SSLCommerz session API client.
pub struct SslCommerzGateway {
  client: reqwest::Client,
  session_url: String,
  store_id: String,
  store_password: String,
}

#[derive(Deserialize)]
struct SessionResponse {
  status: Option<String>,
  #[serde(rename = "GatewayPageURL")]
  gateway_page_url: Option<String>,
  failedreason: Option<String>,
}

impl SslCommerzGateway {
  pub fn new(config: &PaymentConfig) -> AppResult<Self> {
    let session_url = if config.sandbox { SANDBOX_SESSION_URL } else { LIVE_SESSION_URL };
    Self::with_session_url(config, session_url)
  }

  /// Points the client at an arbitrary session endpoint.
  pub fn with_session_url(config: &PaymentConfig, session_url: &str) -> AppResult<Self> {
    let client = reqwest::Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Unable to build payment HTTP client: {}", e)))?;
    Ok(Self {
      client,
      session_url: session_url.to_string(),
      store_id: config.store_id.clone(),
      store_password: config.store_password.clone(),
    })
  }

  fn form_fields(&self, request: &PaymentSessionRequest) -> Vec<(&'static str, String)> {
    let customer = &request.customer;
    vec![
      ("store_id", self.store_id.clone()),
      ("store_passwd", self.store_password.clone()),
      ("total_amount", request.total_amount.clone()),
      ("currency", request.currency.clone()),
      ("tran_id", request.tran_id.clone()),
      ("success_url", request.success_url.clone()),
      ("fail_url", request.fail_url.clone()),
      ("cancel_url", request.cancel_url.clone()),
      ("emi_option", request.emi_option.to_string()),
      ("cus_name", customer.name.clone()),
      ("cus_email", customer.email.clone()),
      ("cus_phone", customer.phone.clone()),
      ("cus_add1", customer.address.clone()),
      ("cus_city", customer.city.clone()),
      ("cus_country", customer.country.clone()),
      ("shipping_method", request.shipping_method.clone()),
      ("multi_card_name", String::new()),
      ("num_of_item", request.num_of_item.to_string()),
      ("product_name", request.product_name.clone()),
      ("product_category", request.product_category.clone()),
      ("product_profile", request.product_profile.clone()),
    ]
  }
}

#[async_trait]
impl PaymentGateway for SslCommerzGateway {
  fn name(&self) -> &'static str {
    "sslcommerz"
  }

  #[instrument(name = "SslCommerzGateway::create_session", skip_all, fields(tran_id = %request.tran_id))]
  async fn create_session(&self, request: &PaymentSessionRequest) -> Result<HostedSession, GatewayError> {
    let response = self
      .client
      .post(&self.session_url)
      .form(&self.form_fields(request))
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      warn!(http_status = status.as_u16(), "payment gateway returned an error status");
      return Err(GatewayError::HttpStatus(status.as_u16()));
    }

    let body: SessionResponse = response
      .json()
      .await
      .map_err(|e| GatewayError::Malformed(e.to_string()))?;
    match (body.status.as_deref(), body.gateway_page_url) {
      (Some("SUCCESS"), Some(url)) if !url.is_empty() => {
        info!("hosted payment session opened");
        Ok(HostedSession { payment_url: url })
      }
      (Some("SUCCESS"), _) => Err(GatewayError::Malformed("SUCCESS without GatewayPageURL".to_string())),
      (other, _) => Err(GatewayError::Rejected(
        body
          .failedreason
          .unwrap_or_else(|| format!("status {}", other.unwrap_or("missing"))),
      )),
    }
  }
}

/// Builds the gateway selected by `PAYMENT_PROVIDER`.
pub fn init_gateway(config: &AppConfig) -> AppResult<Arc<dyn PaymentGateway>> {
  match config.payment.provider {
    PaymentProvider::SslCommerz => {
      info!(sandbox = config.payment.sandbox, "Payment gateway: sslcommerz");
      Ok(Arc::new(SslCommerzGateway::new(&config.payment)?))
    }
    PaymentProvider::Mock => {
      info!("Payment gateway: mock");
      Ok(Arc::new(MockGateway::new(&config.app_base_url)))
    }
  }
}
