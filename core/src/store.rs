// core/src/store.rs

//! The user store port and an in-memory implementation.

use crate::error::StoreError;
use crate::models::{NewUser, Role, User, UserFilter, UserId, UserUpdate};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Single-record access to the user collection.
///
/// Implementations must make each call atomic on its own and enforce two
/// uniqueness rules on every write: one record per email, and at most one
/// `super_admin`, whether the role arrives by insert or by update. Both
/// surface as [`StoreError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
  /// Returns the first record matching `filter`, or `None` when nothing matches.
  async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError>;

  async fn insert_one(&self, user: NewUser) -> Result<User, StoreError>;

  /// Writes the `Some` fields of `update` to the record with `id`.
  async fn update_one(&self, id: UserId, update: UserUpdate) -> Result<(), StoreError>;
}

/// [`UserStore`] held in process memory.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
  users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.users.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.users.read().is_empty()
  }

  pub fn count_by_role(&self, role: Role) -> usize {
    self.users.read().values().filter(|u| u.role == role).count()
  }

  /// Copies of every stored record, oldest first.
  pub fn snapshot(&self) -> Vec<User> {
    let mut users: Vec<User> = self.users.read().values().cloned().collect();
    users.sort_by_key(|u| u.created_at);
    users
  }
}

#[async_trait]
impl UserStore for MemoryUserStore {
  async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError> {
    let guard = self.users.read();
    Ok(
      guard
        .values()
        .filter(|u| filter.matches(u))
        .min_by_key(|u| (u.created_at, u.id))
        .cloned(),
    )
  }

  #[instrument(name = "memory_store::insert_one", skip_all, fields(role = %user.role))]
  async fn insert_one(&self, user: NewUser) -> Result<User, StoreError> {
    let mut guard = self.users.write();

    if guard.values().any(|u| u.email == user.email) {
      return Err(StoreError::Conflict {
        message: format!("email '{}' is already registered", user.email),
      });
    }
    if user.role == Role::SuperAdmin && guard.values().any(|u| u.role == Role::SuperAdmin) {
      return Err(StoreError::Conflict {
        message: "a super_admin already exists".to_string(),
      });
    }

    let id = loop {
      let candidate = UserId::new();
      if !guard.contains_key(&candidate) {
        break candidate;
      }
    };
    let stored = user.into_user(id);
    guard.insert(id, stored.clone());
    debug!(user_id = %id, "Inserted user record.");
    Ok(stored)
  }

  async fn update_one(&self, id: UserId, update: UserUpdate) -> Result<(), StoreError> {
    let mut guard = self.users.write();
    if !guard.contains_key(&id) {
      return Err(StoreError::NotFound { id });
    }
    if update.role == Some(Role::SuperAdmin)
      && guard.values().any(|u| u.role == Role::SuperAdmin && u.id != id)
    {
      return Err(StoreError::Conflict {
        message: "a super_admin already exists".to_string(),
      });
    }
    let user = guard.get_mut(&id).ok_or(StoreError::NotFound { id })?;
    update.apply(user);
    Ok(())
  }
}
