// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use lem_auth::token::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, MIN_SECRET_LEN};
use lem_auth::{SuperuserConfig, DEFAULT_BOOTSTRAP_TIMEOUT};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub jwt_secret: String,
  pub access_token_ttl: Duration,
  pub refresh_token_ttl: Duration,
  pub superuser: SuperuserConfig,
  pub bootstrap_timeout: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_source(|name| env::var(name).ok())
  }

  /// Builds the config from any variable lookup, so tests can feed a map.
  pub fn from_source<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_env = |var_name: &str| lookup(var_name).filter(|v| !v.trim().is_empty());
    let require = |var_name: &str| {
      get_env(var_name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = match ["SERVER_PORT", "PORT"]
      .into_iter()
      .find_map(|name| get_env(name).map(|raw| (name, raw)))
    {
      Some((name, raw)) => parse_var(name, &raw)?,
      None => 8080,
    };
    let database_url = require("DATABASE_URL")?;

    let jwt_secret = require("JWT_SECRET")?;
    if jwt_secret.len() < MIN_SECRET_LEN {
      return Err(AppError::Config(format!(
        "JWT_SECRET must be at least {} bytes long",
        MIN_SECRET_LEN
      )));
    }

    let secs = |var_name: &str, default: u64| -> Result<Duration> {
      let value = match get_env(var_name) {
        Some(raw) => parse_var::<u64>(var_name, &raw)?,
        None => default,
      };
      if value == 0 {
        return Err(AppError::Config(format!("{} must be greater than zero", var_name)));
      }
      Ok(Duration::from_secs(value))
    };
    let access_token_ttl = secs("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL.as_secs())?;
    let refresh_token_ttl = secs("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL.as_secs())?;
    let bootstrap_timeout = secs("BOOTSTRAP_TIMEOUT_SECS", DEFAULT_BOOTSTRAP_TIMEOUT.as_secs())?;

    let superuser = SuperuserConfig::new(lookup("SUPERUSER_EMAIL"), lookup("SUPERUSER_PASSWORD"));

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      jwt_secret,
      access_token_ttl,
      refresh_token_ttl,
      superuser,
      bootstrap_timeout,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_var<T>(var_name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
}

impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("jwt_secret", &"[REDACTED]")
      .field("access_token_ttl", &self.access_token_ttl)
      .field("refresh_token_ttl", &self.refresh_token_ttl)
      .field("superuser", &self.superuser)
      .field("bootstrap_timeout", &self.bootstrap_timeout)
      .finish()
  }
}
