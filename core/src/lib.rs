// core/src/lib.rs

//! lem-auth: the authentication slice of the lem backend.
//!
//! - [`BootstrapService`] runs once at startup and makes sure a single
//!   `super_admin` account exists, using credentials handed in through
//!   [`SuperuserConfig`].
//! - [`LoginService`] checks an email/password pair against the
//!   [`UserStore`] and issues an access token and a refresh token.
//!
//! Storage is behind the [`UserStore`] trait; [`MemoryUserStore`] is the
//! in-process implementation used by tests.

pub mod bootstrap;
pub mod error;
pub mod login;
pub mod models;
pub mod password;
pub mod store;
pub mod token;

pub use crate::bootstrap::{BootstrapOutcome, BootstrapService, SuperuserConfig, DEFAULT_BOOTSTRAP_TIMEOUT};
pub use crate::error::{BootstrapError, LoginError, PasswordHashError, RefreshError, StoreError, TokenError};
pub use crate::login::LoginService;
pub use crate::models::{
  LoginRequest, LoginResponse, NewUser, RefreshRequest, RefreshResponse, Role, User, UserFilter, UserId, UserUpdate,
};
pub use crate::password::PasswordHasher;
pub use crate::store::{MemoryUserStore, UserStore};
pub use crate::token::{AccessClaims, JwtTokenIssuer, RefreshClaims, TokenIssuer, TokenKind};

// Re-exported so callers can tune hashing cost without depending on argon2 directly.
pub use argon2::Params as HashParams;
