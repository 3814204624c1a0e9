// core/src/models.rs

//! Data structures for users and the login/refresh exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Opaque user identifier assigned by the user store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
  /// Generates a fresh random identifier.
  pub fn new() -> Self {
    UserId(Uuid::new_v4())
  }

  pub fn as_uuid(&self) -> Uuid {
    self.0
  }
}

impl Default for UserId {
  fn default() -> Self {
    Self::new()
  }
}

impl From<Uuid> for UserId {
  fn from(value: Uuid) -> Self {
    UserId(value)
  }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// User role. `SuperAdmin` is the account created by bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  SuperAdmin,
  Admin,
  User,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::SuperAdmin => "super_admin",
      Role::Admin => "admin",
      Role::User => "user",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown user role: '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
  type Err = UnknownRole;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "super_admin" => Ok(Role::SuperAdmin),
      "admin" => Ok(Role::Admin),
      "user" => Ok(Role::User),
      other => Err(UnknownRole(other.to_string())),
    }
  }
}

/// A stored user record.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
  pub id: UserId,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("User")
      .field("id", &self.id)
      .field("email", &self.email)
      .field("password_hash", &"[REDACTED]")
      .field("role", &self.role)
      .field("created_at", &self.created_at)
      .field("updated_at", &self.updated_at)
      .finish()
  }
}

/// Insert payload for a user record. The store assigns the id.
#[derive(Clone)]
pub struct NewUser {
  pub email: String,
  pub password_hash: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl NewUser {
  /// Builds a record stamped with the same creation and update time.
  pub fn new(email: impl Into<String>, password_hash: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
    Self {
      email: email.into(),
      password_hash: password_hash.into(),
      role,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn into_user(self, id: UserId) -> User {
    User {
      id,
      email: self.email,
      password_hash: self.password_hash,
      role: self.role,
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

impl fmt::Debug for NewUser {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NewUser")
      .field("email", &self.email)
      .field("role", &self.role)
      .finish_non_exhaustive()
  }
}

/// Equality filter selecting a single user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
  Id(UserId),
  /// Exact, case-sensitive match.
  Email(String),
  Role(Role),
}

impl UserFilter {
  pub fn matches(&self, user: &User) -> bool {
    match self {
      UserFilter::Id(id) => user.id == *id,
      UserFilter::Email(email) => user.email == *email,
      UserFilter::Role(role) => user.role == *role,
    }
  }
}

/// Partial update: only the fields that are `Some` get written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
  pub password_hash: Option<String>,
  pub role: Option<Role>,
  pub updated_at: Option<DateTime<Utc>>,
}

impl UserUpdate {
  /// Update that only bumps `updated_at`.
  pub fn touch(now: DateTime<Utc>) -> Self {
    Self {
      updated_at: Some(now),
      ..Default::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.password_hash.is_none() && self.role.is_none() && self.updated_at.is_none()
  }

  pub fn apply(&self, user: &mut User) {
    if let Some(hash) = &self.password_hash {
      user.password_hash = hash.clone();
    }
    if let Some(role) = self.role {
      user.role = role;
    }
    if let Some(updated_at) = self.updated_at {
      user.updated_at = updated_at;
    }
  }
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

impl LoginRequest {
  pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      email: email.into(),
      password: password.into(),
    }
  }
}

impl fmt::Debug for LoginRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoginRequest")
      .field("email", &self.email)
      .field("password", &"[REDACTED]")
      .finish()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
  pub access_token: String,
  pub refresh_token: String,
}

#[derive(Clone, Deserialize)]
pub struct RefreshRequest {
  pub refresh_token: String,
}

impl fmt::Debug for RefreshRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RefreshRequest").finish_non_exhaustive()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
  pub access_token: String,
}
