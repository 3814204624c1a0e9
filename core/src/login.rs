// core/src/login.rs

//! Per-request login and token refresh.

use crate::error::{LoginError, RefreshError};
use crate::models::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, UserFilter, UserUpdate};
use crate::password::PasswordHasher;
use crate::store::UserStore;
use crate::token::TokenIssuer;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{event, info, instrument, warn, Level};

#[derive(Clone)]
pub struct LoginService {
  store: Arc<dyn UserStore>,
  hasher: PasswordHasher,
  tokens: Arc<dyn TokenIssuer>,
}

impl LoginService {
  pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: Arc<dyn TokenIssuer>) -> Self {
    Self { store, hasher, tokens }
  }

  /// Checks the credentials and issues an access/refresh token pair.
  ///
  /// Bumping the user's `updated_at` is best effort: a failed write is
  /// logged and the login still succeeds.
  #[instrument(name = "login::login", skip(self, request), fields(email = %request.email))]
  pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, LoginError> {
    let user = self
      .store
      .find_one(&UserFilter::Email(request.email.clone()))
      .await?
      .ok_or_else(|| {
        warn!("User not found for login.");
        LoginError::UserNotFound
      })?;

    if !self.hasher.verify(&user.password_hash, &request.password) {
      warn!(user_id = %user.id, "Password mismatch on login.");
      return Err(LoginError::InvalidPassword);
    }

    let access_token = self
      .tokens
      .issue_access_token(user.id, &user.email, user.role)
      .map_err(LoginError::TokenGeneration)?;
    let refresh_token = self
      .tokens
      .issue_refresh_token(user.id)
      .map_err(LoginError::TokenGeneration)?;

    if let Err(e) = self.store.update_one(user.id, UserUpdate::touch(Utc::now())).await {
      event!(Level::WARN, user_id = %user.id, error = %e, "Failed to record login time; continuing.");
    }

    info!(user_id = %user.id, role = %user.role, "Login successful.");
    Ok(LoginResponse {
      access_token,
      refresh_token,
    })
  }

  /// Exchanges a valid refresh token for a new access token built from the
  /// user's current email and role.
  #[instrument(name = "login::refresh", skip_all)]
  pub async fn refresh(&self, request: RefreshRequest) -> Result<RefreshResponse, RefreshError> {
    let claims = self
      .tokens
      .verify_refresh_token(&request.refresh_token)
      .map_err(|e| {
        warn!(error = %e, "Rejected refresh token.");
        RefreshError::InvalidToken(e)
      })?;

    let user = self
      .store
      .find_one(&UserFilter::Id(claims.sub))
      .await?
      .ok_or(RefreshError::UserNotFound)?;

    let access_token = self
      .tokens
      .issue_access_token(user.id, &user.email, user.role)
      .map_err(RefreshError::TokenGeneration)?;

    event!(Level::DEBUG, user_id = %user.id, "Access token refreshed.");
    Ok(RefreshResponse { access_token })
  }
}

impl fmt::Debug for LoginService {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoginService")
      .field("hasher", &self.hasher)
      .finish_non_exhaustive()
  }
}
