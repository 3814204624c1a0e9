// core/src/bootstrap.rs

//! Startup routine that makes sure a `super_admin` account exists.

use crate::error::{BootstrapError, StoreError};
use crate::models::{NewUser, Role, UserFilter, UserId};
use crate::password::PasswordHasher;
use crate::store::UserStore;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials for the bootstrapped super admin. Empty values count as absent.
#[derive(Clone, Default)]
pub struct SuperuserConfig {
  pub email: Option<String>,
  pub password: Option<String>,
}

impl SuperuserConfig {
  pub fn new(email: Option<String>, password: Option<String>) -> Self {
    Self {
      email: email.filter(|v| !v.is_empty()),
      password: password.filter(|v| !v.is_empty()),
    }
  }

  fn credentials(&self) -> Option<(&str, &str)> {
    let email = self.email.as_deref().filter(|v| !v.is_empty())?;
    let password = self.password.as_deref().filter(|v| !v.is_empty())?;
    Some((email, password))
  }
}

impl fmt::Debug for SuperuserConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SuperuserConfig")
      .field("email", &self.email)
      .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
      .finish()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
  /// A super admin was already present; nothing was written.
  AlreadyExists,
  /// No super admin and no complete credentials; nothing was written.
  Skipped,
  Created(UserId),
}

pub struct BootstrapService {
  store: Arc<dyn UserStore>,
  hasher: PasswordHasher,
  config: SuperuserConfig,
  timeout: Duration,
}

impl BootstrapService {
  pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, config: SuperuserConfig) -> Self {
    Self {
      store,
      hasher,
      config,
      timeout: DEFAULT_BOOTSTRAP_TIMEOUT,
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Creates the super admin unless one exists or credentials are missing.
  ///
  /// The whole routine is bounded by the configured timeout; on elapse the
  /// pending store call is dropped and [`BootstrapError::TimedOut`] returned.
  #[instrument(name = "bootstrap::ensure_superuser", skip(self), fields(timeout = ?self.timeout), err(Display))]
  pub async fn ensure_superuser(&self) -> Result<BootstrapOutcome, BootstrapError> {
    match tokio::time::timeout(self.timeout, self.run()).await {
      Ok(result) => result,
      Err(_) => Err(BootstrapError::TimedOut { after: self.timeout }),
    }
  }

  async fn run(&self) -> Result<BootstrapOutcome, BootstrapError> {
    if self
      .store
      .find_one(&UserFilter::Role(Role::SuperAdmin))
      .await?
      .is_some()
    {
      info!("Superuser already exists.");
      return Ok(BootstrapOutcome::AlreadyExists);
    }

    let Some((email, password)) = self.config.credentials() else {
      warn!("SUPERUSER_EMAIL or SUPERUSER_PASSWORD not set. Skipping superuser bootstrap.");
      return Ok(BootstrapOutcome::Skipped);
    };

    let password_hash = self.hasher.hash(password)?;
    let superuser = NewUser::new(email, password_hash, Role::SuperAdmin, Utc::now());

    match self.store.insert_one(superuser).await {
      Ok(user) => {
        info!(user_id = %user.id, email = %user.email, "Successfully bootstrapped superuser.");
        Ok(BootstrapOutcome::Created(user.id))
      }
      Err(conflict @ StoreError::Conflict { .. }) => self.resolve_conflict(conflict).await,
      Err(e) => Err(e.into()),
    }
  }

  /// A conflict means either another bootstrap won the race (fine) or the
  /// email belongs to an ordinary account (an error).
  async fn resolve_conflict(&self, conflict: StoreError) -> Result<BootstrapOutcome, BootstrapError> {
    if self
      .store
      .find_one(&UserFilter::Role(Role::SuperAdmin))
      .await?
      .is_some()
    {
      warn!("Superuser was created concurrently; treating as already bootstrapped.");
      return Ok(BootstrapOutcome::AlreadyExists);
    }
    Err(conflict.into())
  }
}

impl fmt::Debug for BootstrapService {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BootstrapService")
      .field("config", &self.config)
      .field("timeout", &self.timeout)
      .finish_non_exhaustive()
  }
}
