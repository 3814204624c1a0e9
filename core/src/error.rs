// core/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

use crate::models::UserId;
use crate::token::TokenKind;

#[derive(Debug, Error)]
pub enum StoreError {
  /// A uniqueness rule rejected the write (duplicate email, second super admin).
  #[error("Conflicting user record: {message}")]
  Conflict { message: String },

  #[error("No user record with id {id}")]
  NotFound { id: UserId },

  #[error("User store backend failure. Source: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend { source: err }
  }
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
  #[error("Password cannot be empty")]
  Empty,

  // password_hash::Error only implements std::error::Error behind its `std` feature.
  #[error("Argon2 hashing failed: {0}")]
  Argon2(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
  #[error("Token secret must be at least {min} bytes long")]
  WeakSecret { min: usize },

  #[error("Failed to encode {kind} token. Source: {source}")]
  Encode {
    kind: TokenKind,
    #[source]
    source: jsonwebtoken::errors::Error,
  },

  #[error("Invalid token: {0}")]
  Invalid(#[source] jsonwebtoken::errors::Error),

  #[error("Expected a {expected} token, got a {found} token")]
  WrongKind { expected: TokenKind, found: TokenKind },
}

#[derive(Debug, Error)]
pub enum LoginError {
  #[error("user not found")]
  UserNotFound,

  #[error("invalid password")]
  InvalidPassword,

  #[error("failed to generate tokens")]
  TokenGeneration(#[source] TokenError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum RefreshError {
  #[error("invalid refresh token")]
  InvalidToken(#[source] TokenError),

  #[error("user not found")]
  UserNotFound,

  #[error("failed to generate tokens")]
  TokenGeneration(#[source] TokenError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
  #[error("Superuser bootstrap timed out after {after:?}")]
  TimedOut { after: Duration },

  #[error("Failed to hash superuser password: {0}")]
  Hash(#[from] PasswordHashError),

  #[error("User store failed during superuser bootstrap: {0}")]
  Store(#[from] StoreError),
}
