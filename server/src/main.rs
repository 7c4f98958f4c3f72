// src/main.rs

use bazaar_server::config::{AppConfig, LogFormat};
use bazaar_server::services::seed::seed_demo_data;
use bazaar_server::state::AppState;
use bazaar_server::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use std::io;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  // Config comes first: LOG_FORMAT picks the subscriber.
  let app_config = AppConfig::from_env().map_err(|e| {
    eprintln!("Configuration error: {}", e);
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
  })?;
  init_tracing(app_config.log_format);

  tracing::info!("Starting order service...");

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let seed_db = app_config.seed_db;

  let app_state = AppState::from_config(app_config).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to initialise application state.");
    io::Error::new(io::ErrorKind::Other, e.to_string())
  })?;
  tracing::info!(pipelines = app_state.pipelines.len(), "Pipelines registered.");

  if seed_db {
    if let Err(e) = seed_demo_data(app_state.store.as_ref()).await {
      tracing::error!(error = %e, "Failed to seed demo data.");
    }
  }

  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
