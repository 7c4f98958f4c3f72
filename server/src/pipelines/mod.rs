// src/pipelines/mod.rs

//! Registers every pipeline the server runs.

use crate::errors::AppError;
use crate::state::AppState;
use bazaar_flow::Registry;
use std::sync::Arc;

pub mod contexts;

pub mod callback_pipeline;
pub mod cancel_pipeline;
pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod payment_pipeline;

/// Called once while the application state is assembled.
pub fn register_all_pipelines(registry: &Arc<Registry<AppError>>, app_state: &AppState) {
  tracing::info!("Registering pipelines...");

  checkout_pipeline::register_checkout_pipeline(registry, app_state);
  cancel_pipeline::register_cancel_order_pipeline(registry, app_state);
  cart_pipeline::register_add_to_cart_pipeline(registry, app_state);
  payment_pipeline::register_initiate_payment_pipeline(registry, app_state);
  callback_pipeline::register_payment_callback_pipeline(registry, app_state);

  tracing::info!(count = registry.len(), "All application pipelines registered.");
}
