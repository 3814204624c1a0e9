// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use chrono::Utc;
use lem_auth::{
  AccessClaims, HashParams, JwtTokenIssuer, MemoryUserStore, NewUser, PasswordHasher, RefreshClaims, Role, StoreError,
  TokenError, TokenIssuer, TokenKind, User, UserFilter, UserId, UserStore, UserUpdate,
};
use std::sync::{
  atomic::{AtomicBool, AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

pub const TEST_SECRET: &[u8] = b"integration-test-signing-secret";

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Argon2 with the smallest legal cost so tests stay fast in debug builds.
pub fn fast_hasher() -> PasswordHasher {
  PasswordHasher::with_params(HashParams::new(8, 1, 1, None).expect("valid argon2 params"))
}

pub fn issuer() -> Arc<JwtTokenIssuer> {
  Arc::new(JwtTokenIssuer::new(TEST_SECRET).expect("test secret is long enough"))
}

pub async fn seed_user(store: &dyn UserStore, email: &str, password: &str, role: Role) -> User {
  let hash = fast_hasher().hash(password).expect("hash test password");
  store
    .insert_one(NewUser::new(email, hash, role, Utc::now()))
    .await
    .expect("seed user")
}

// --- Fault-injecting store ---

/// Wraps a [`MemoryUserStore`] and fails selected operations on demand.
#[derive(Default)]
pub struct FlakyStore {
  pub inner: MemoryUserStore,
  pub fail_find: AtomicBool,
  pub fail_insert: AtomicBool,
  pub fail_update: AtomicBool,
  /// When set, `find_one` by role reports "no documents" this many times before answering truthfully.
  pub hide_role_matches: AtomicUsize,
  pub update_calls: AtomicUsize,
  pub insert_calls: AtomicUsize,
}

fn backend_down(op: &str) -> StoreError {
  StoreError::Backend {
    source: anyhow::anyhow!("connection reset during {}", op),
  }
}

#[async_trait]
impl UserStore for FlakyStore {
  async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError> {
    if self.fail_find.load(Ordering::SeqCst) {
      return Err(backend_down("find_one"));
    }
    if matches!(filter, UserFilter::Role(_))
      && self
        .hide_role_matches
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
      return Ok(None);
    }
    self.inner.find_one(filter).await
  }

  async fn insert_one(&self, user: NewUser) -> Result<User, StoreError> {
    self.insert_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_insert.load(Ordering::SeqCst) {
      return Err(backend_down("insert_one"));
    }
    self.inner.insert_one(user).await
  }

  async fn update_one(&self, id: UserId, update: UserUpdate) -> Result<(), StoreError> {
    self.update_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_update.load(Ordering::SeqCst) {
      return Err(backend_down("update_one"));
    }
    self.inner.update_one(id, update).await
  }
}

/// A store whose every call hangs forever.
pub struct StalledStore;

#[async_trait]
impl UserStore for StalledStore {
  async fn find_one(&self, _filter: &UserFilter) -> Result<Option<User>, StoreError> {
    std::future::pending().await
  }

  async fn insert_one(&self, _user: NewUser) -> Result<User, StoreError> {
    std::future::pending().await
  }

  async fn update_one(&self, _id: UserId, _update: UserUpdate) -> Result<(), StoreError> {
    std::future::pending().await
  }
}

// --- Fault-injecting token issuer ---

pub struct BrokenIssuer {
  pub inner: JwtTokenIssuer,
  pub fail_access: bool,
  pub fail_refresh: bool,
}

impl BrokenIssuer {
  pub fn new(fail_access: bool, fail_refresh: bool) -> Self {
    Self {
      inner: JwtTokenIssuer::new(TEST_SECRET).expect("test secret is long enough"),
      fail_access,
      fail_refresh,
    }
  }
}

fn encode_failure(kind: TokenKind) -> TokenError {
  TokenError::Encode {
    kind,
    source: jsonwebtoken::errors::ErrorKind::InvalidKeyFormat.into(),
  }
}

impl TokenIssuer for BrokenIssuer {
  fn issue_access_token(&self, user_id: UserId, email: &str, role: Role) -> Result<String, TokenError> {
    if self.fail_access {
      return Err(encode_failure(TokenKind::Access));
    }
    self.inner.issue_access_token(user_id, email, role)
  }

  fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenError> {
    if self.fail_refresh {
      return Err(encode_failure(TokenKind::Refresh));
    }
    self.inner.issue_refresh_token(user_id)
  }

  fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
    self.inner.verify_access_token(token)
  }

  fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
    self.inner.verify_refresh_token(token)
  }
}
