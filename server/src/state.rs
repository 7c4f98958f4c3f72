// src/state.rs
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::pipelines;
use crate::services::payment_gateway::{self, PaymentGateway};
use crate::store::{self, Store};
use bazaar_flow::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub pipelines: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires an application around an existing store and gateway and
  /// registers every pipeline.
  pub fn new(config: AppConfig, store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
    let app_state = AppState {
      store,
      gateway,
      pipelines: Arc::new(Registry::new()),
      config: Arc::new(config),
    };
    pipelines::register_all_pipelines(&app_state.pipelines, &app_state);
    app_state
  }

  /// Opens the configured store and gateway.
  pub async fn from_config(config: AppConfig) -> Result<Self> {
    let store = store::init_store(&config).await?;
    let gateway = payment_gateway::init_gateway(&config)?;
    Ok(Self::new(config, store, gateway))
  }
}
