// server/src/state.rs
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use lem_auth::{JwtTokenIssuer, LoginService, PasswordHasher, TokenIssuer, UserStore};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct AppState {
  pub login_service: LoginService,
}

impl AppState {
  pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: Arc<dyn TokenIssuer>) -> Self {
    Self {
      login_service: LoginService::new(store, hasher, tokens),
    }
  }

  /// Wires the services with the token settings from `config`.
  pub fn from_config(config: &AppConfig, store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Result<Self> {
    let tokens = JwtTokenIssuer::new(config.jwt_secret.as_bytes())
      .map_err(|e| AppError::Config(e.to_string()))?
      .with_ttls(config.access_token_ttl, config.refresh_token_ttl);
    Ok(Self::new(store, hasher, Arc::new(tokens)))
  }
}
