// server/src/main.rs

mod config;
mod db;
mod errors;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::PgUserStore;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use lem_auth::{BootstrapOutcome, BootstrapService, PasswordHasher, UserStore};
use std::env;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);

  // LOG_FORMAT=json switches to one JSON object per line. Read from the
  // process environment, since `.env` is loaded with the config.
  if env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

async fn bootstrap_superuser(config: &AppConfig, store: Arc<dyn UserStore>, hasher: PasswordHasher) {
  let service =
    BootstrapService::new(store, hasher, config.superuser.clone()).with_timeout(config.bootstrap_timeout);
  match service.ensure_superuser().await {
    Ok(BootstrapOutcome::Created(user_id)) => tracing::info!(%user_id, "Superuser created."),
    Ok(BootstrapOutcome::AlreadyExists) => tracing::info!("Superuser present."),
    Ok(BootstrapOutcome::Skipped) => tracing::info!("Superuser bootstrap skipped."),
    Err(e) => tracing::error!(error = %e, "Failed to bootstrap superuser; continuing startup."),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  init_tracing();

  tracing::info!("Starting lem auth server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };
  tracing::debug!(config = ?app_config, "Loaded config details");

  let db_pool = match db::connect_and_migrate(&app_config.database_url).await {
    Ok(pool) => pool,
    Err(e) => {
      tracing::error!(error = %e, "Failed to prepare the database.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db_pool));
  let hasher = PasswordHasher::default();

  bootstrap_superuser(&app_config, store.clone(), hasher.clone()).await;

  let app_state = match AppState::from_config(&app_config, store, hasher) {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to build application state.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let server_address = app_config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
