// core/src/token.rs

//! Signed access and refresh tokens (HS256 JWTs).
//!
//! Access tokens carry the user's id, email and role and are short-lived.
//! Refresh tokens carry only the user id plus a unique `jti` and live longer.
//! Both carry a `kind` claim so one can never be accepted in place of the other.

use crate::error::TokenError;
use crate::models::{Role, UserId};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

pub const MIN_SECRET_LEN: usize = 12;
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
  Access,
  Refresh,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TokenKind::Access => f.write_str("access"),
      TokenKind::Refresh => f.write_str("refresh"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
  pub sub: UserId,
  pub email: String,
  pub role: Role,
  pub kind: TokenKind,
  pub iat: i64,
  pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
  pub sub: UserId,
  pub kind: TokenKind,
  pub jti: Uuid,
  pub iat: i64,
  pub exp: i64,
}

#[derive(Deserialize)]
struct KindClaim {
  kind: TokenKind,
}

/// Issues and verifies the credentials handed out on login.
pub trait TokenIssuer: Send + Sync {
  fn issue_access_token(&self, user_id: UserId, email: &str, role: Role) -> Result<String, TokenError>;

  fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenError>;

  fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError>;

  fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError>;
}

/// [`TokenIssuer`] signing with a shared HMAC secret.
#[derive(Clone)]
pub struct JwtTokenIssuer {
  encoding: EncodingKey,
  decoding: DecodingKey,
  validation: Validation,
  access_ttl: Duration,
  refresh_ttl: Duration,
}

impl JwtTokenIssuer {
  pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
    if secret.len() < MIN_SECRET_LEN {
      return Err(TokenError::WeakSecret { min: MIN_SECRET_LEN });
    }

    Ok(Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation: Validation::new(Algorithm::HS256),
      access_ttl: DEFAULT_ACCESS_TTL,
      refresh_ttl: DEFAULT_REFRESH_TTL,
    })
  }

  pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
    self.access_ttl = access_ttl;
    self.refresh_ttl = refresh_ttl;
    self
  }

  pub fn access_ttl(&self) -> Duration {
    self.access_ttl
  }

  pub fn refresh_ttl(&self) -> Duration {
    self.refresh_ttl
  }

  fn encode<C: Serialize>(&self, kind: TokenKind, claims: &C) -> Result<String, TokenError> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
      .map_err(|source| TokenError::Encode { kind, source })
  }

  fn decode<C: DeserializeOwned>(&self, token: &str, expected: TokenKind) -> Result<C, TokenError> {
    // Checked first so a token of the other kind reports WrongKind instead of a missing claim.
    let found = jsonwebtoken::decode::<KindClaim>(token, &self.decoding, &self.validation)
      .map_err(TokenError::Invalid)?
      .claims
      .kind;
    if found != expected {
      debug!(%expected, %found, "Rejected token of the wrong kind.");
      return Err(TokenError::WrongKind { expected, found });
    }

    jsonwebtoken::decode::<C>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(TokenError::Invalid)
  }
}

fn expiry(iat: i64, ttl: Duration) -> i64 {
  iat.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

impl TokenIssuer for JwtTokenIssuer {
  #[instrument(name = "token::issue_access", skip(self, email), fields(user_id = %user_id, role = %role))]
  fn issue_access_token(&self, user_id: UserId, email: &str, role: Role) -> Result<String, TokenError> {
    let iat = Utc::now().timestamp();
    let claims = AccessClaims {
      sub: user_id,
      email: email.to_string(),
      role,
      kind: TokenKind::Access,
      iat,
      exp: expiry(iat, self.access_ttl),
    };
    self.encode(TokenKind::Access, &claims)
  }

  #[instrument(name = "token::issue_refresh", skip(self), fields(user_id = %user_id))]
  fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenError> {
    let iat = Utc::now().timestamp();
    let claims = RefreshClaims {
      sub: user_id,
      kind: TokenKind::Refresh,
      jti: Uuid::new_v4(),
      iat,
      exp: expiry(iat, self.refresh_ttl),
    };
    self.encode(TokenKind::Refresh, &claims)
  }

  fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
    self.decode(token, TokenKind::Access)
  }

  fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
    self.decode(token, TokenKind::Refresh)
  }
}

impl fmt::Debug for JwtTokenIssuer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JwtTokenIssuer")
      .field("access_ttl", &self.access_ttl)
      .field("refresh_ttl", &self.refresh_ttl)
      .finish_non_exhaustive()
  }
}
