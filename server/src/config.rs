// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" | "in-memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!("Unknown STORE_BACKEND '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
  SslCommerz,
  Mock,
}

impl FromStr for PaymentProvider {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "sslcommerz" => Ok(PaymentProvider::SslCommerz),
      "mock" => Ok(PaymentProvider::Mock),
      other => Err(AppError::Config(format!("Unknown PAYMENT_PROVIDER '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct PaymentConfig {
  pub provider: PaymentProvider,
  pub store_id: String,
  pub store_password: String,
  pub sandbox: bool,
  pub currency: String,
  pub timeout: Duration,
}

impl std::fmt::Debug for PaymentConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PaymentConfig")
      .field("provider", &self.provider)
      .field("store_id", &self.store_id)
      .field("store_password", &"[REDACTED]")
      .field("sandbox", &self.sandbox)
      .field("currency", &self.currency)
      .field("timeout", &self.timeout)
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  /// Public address of this service. Base URLs never end with a slash.
  pub app_base_url: String,
  /// Address the payment gateway calls back on.
  pub backend_base_url: String,
  pub frontend_base_url: String,
  pub payment: PaymentConfig,
  pub seed_db: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  /// Builds the configuration from an arbitrary variable source.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    let parse_bool = |var_name: &str, default: bool| -> Result<bool> {
      match get_env(var_name) {
        Ok(raw) => raw
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value: {}", var_name, e))),
        Err(_) => Ok(default),
      }
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let store_backend = match get_env("STORE_BACKEND") {
      Ok(raw) => raw.parse::<StoreBackend>()?,
      Err(_) => StoreBackend::Postgres,
    };
    let database_url = get_env("DATABASE_URL").ok();
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required by the postgres store)".to_string(),
      ));
    }

    let app_base_url = trim_base_url(
      get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port)),
    );
    let backend_base_url = trim_base_url(get_env("BACKEND_BASE_URL").unwrap_or_else(|_| app_base_url.clone()));
    let frontend_base_url =
      trim_base_url(get_env("FRONTEND_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()));

    let provider = match get_env("PAYMENT_PROVIDER") {
      Ok(raw) => raw.parse::<PaymentProvider>()?,
      Err(_) => PaymentProvider::Mock,
    };
    let (store_id, store_password) = match provider {
      PaymentProvider::SslCommerz => (get_env("PAYMENT_STORE_ID")?, get_env("PAYMENT_STORE_PASSWORD")?),
      PaymentProvider::Mock => (
        get_env("PAYMENT_STORE_ID").unwrap_or_else(|_| "mock_store".to_string()),
        get_env("PAYMENT_STORE_PASSWORD").unwrap_or_default(),
      ),
    };
    let timeout_secs = get_env("PAYMENT_TIMEOUT_SECS")
      .unwrap_or_else(|_| "30".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid PAYMENT_TIMEOUT_SECS: {}", e)))?;
    if timeout_secs == 0 {
      return Err(AppError::Config("PAYMENT_TIMEOUT_SECS must be positive".to_string()));
    }
    let payment = PaymentConfig {
      provider,
      store_id,
      store_password,
      sandbox: parse_bool("PAYMENT_SANDBOX", true)?,
      currency: get_env("PAYMENT_CURRENCY").unwrap_or_else(|_| "BDT".to_string()),
      timeout: Duration::from_secs(timeout_secs),
    };

    let seed_db = parse_bool("SEED_DB", false)?;
    let log_format = match get_env("LOG_FORMAT").map(|v| v.to_ascii_lowercase()) {
      Ok(v) if v == "json" => LogFormat::Json,
      Ok(v) if v == "text" || v == "pretty" => LogFormat::Text,
      Ok(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
      Err(_) => LogFormat::Text,
    };

    tracing::info!(
      store_backend = ?store_backend,
      payment_provider = ?payment.provider,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      app_base_url,
      backend_base_url,
      frontend_base_url,
      payment,
      seed_db,
      log_format,
    })
  }
}

fn trim_base_url(url: String) -> String {
  url.trim_end_matches('/').to_string()
}
