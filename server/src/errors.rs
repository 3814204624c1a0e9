// server/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use lem_auth::{LoginError, RefreshError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("User Store Error: {0}")]
  Store(#[from] StoreError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<LoginError> for AppError {
  fn from(err: LoginError) -> Self {
    match err {
      LoginError::UserNotFound => AppError::NotFound(err.to_string()),
      LoginError::InvalidPassword => AppError::Auth(err.to_string()),
      LoginError::TokenGeneration(source) => AppError::Internal(format!("token generation failed: {}", source)),
      LoginError::Store(source) => AppError::Store(source),
    }
  }
}

impl From<RefreshError> for AppError {
  fn from(err: RefreshError) -> Self {
    match err {
      RefreshError::InvalidToken(_) => AppError::Auth(err.to_string()),
      RefreshError::UserNotFound => AppError::NotFound(err.to_string()),
      RefreshError::TokenGeneration(source) => AppError::Internal(format!("token generation failed: {}", source)),
      RefreshError::Store(source) => AppError::Store(source),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Migrate(_)
      | AppError::Store(_)
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    // Server-side failures are logged in full but answered generically.
    let message = if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
      "An internal error occurred".to_string()
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
      match self {
        AppError::Validation(m) | AppError::Auth(m) | AppError::NotFound(m) => m.clone(),
        other => other.to_string(),
      }
    };
    HttpResponse::build(status).json(json!({ "error": message }))
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
