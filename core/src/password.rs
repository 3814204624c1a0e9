// core/src/password.rs

//! Password hashing and verification with Argon2id.

use crate::error::PasswordHashError;
use argon2::{
  password_hash::{
    rand_core::OsRng, // For generating random salts
    PasswordHash,
    PasswordHasher as _,
    PasswordVerifier,
    SaltString,
  },
  Algorithm, Argon2, Params, Version,
};
use std::fmt;
use tracing::{debug, error, instrument};

/// Hashes and verifies passwords. Cheap to clone.
///
/// Hashes are PHC strings that carry their own parameters, so a hasher
/// built with different [`Params`] still verifies them.
#[derive(Clone, Default)]
pub struct PasswordHasher {
  argon2: Argon2<'static>,
}

impl PasswordHasher {
  /// Argon2id v0x13 with caller-chosen cost parameters.
  pub fn with_params(params: Params) -> Self {
    Self {
      argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
    }
  }

  /// Hashes a plain-text password with a fresh random salt.
  #[instrument(name = "password::hash", skip_all, err(Display))]
  pub fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
    if password.is_empty() {
      return Err(PasswordHashError::Empty);
    }

    let salt = SaltString::generate(&mut OsRng);
    self
      .argon2
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| {
        error!(error = %e, "Argon2 password hashing failed.");
        PasswordHashError::Argon2(e.to_string())
      })
  }

  /// Compares `password` against a stored hash in constant time.
  ///
  /// A malformed stored hash never matches.
  #[instrument(name = "password::verify", skip_all, fields(hash_len = stored_hash.len()))]
  pub fn verify(&self, stored_hash: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
      Ok(parsed) => parsed,
      Err(e) => {
        error!(error = %e, "Stored password hash is malformed.");
        return false;
      }
    };

    match self.argon2.verify_password(password.as_bytes(), &parsed) {
      Ok(()) => true,
      Err(argon2::password_hash::Error::Password) => {
        debug!("Password does not match stored hash.");
        false
      }
      Err(e) => {
        error!(error = %e, "Argon2 password verification failed.");
        false
      }
    }
  }
}

impl fmt::Debug for PasswordHasher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PasswordHasher")
      .field("params", self.argon2.params())
      .finish()
  }
}
