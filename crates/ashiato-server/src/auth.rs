//! Password hashing, bearer tokens and the authentication middleware.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use ashiato_api::Viewer;
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Token signing parameters for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub jwt_secret: String,
  pub token_ttl:  chrono::Duration,
}

impl std::fmt::Debug for AuthConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AuthConfig")
      .field("jwt_secret", &"<redacted>")
      .field("token_ttl", &self.token_ttl)
      .finish()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub:      Uuid,
  pub username: String,
  pub iat:      i64,
  pub exp:      i64,
}

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Hash `password` into an argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> Result<(), Error> {
  let parsed = PasswordHash::new(phc).map_err(|e| Error::Hash(e.to_string()))?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| Error::Unauthorized)
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

pub fn issue_token(config: &AuthConfig, user_id: Uuid, username: &str) -> Result<String, Error> {
  let now = chrono::Utc::now();
  let claims = Claims {
    sub:      user_id,
    username: username.to_string(),
    iat:      now.timestamp(),
    exp:      (now + config.token_ttl).timestamp(),
  };

  Ok(encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
  )?)
}

/// Decode and validate a token. Any failure, expiry included, is
/// [`Error::Unauthorized`].
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, Error> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
    &Validation::default(),
  )
  .map(|data| data.claims)
  .map_err(|e| {
    tracing::debug!(error = %e, "rejected bearer token");
    Error::Unauthorized
  })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
}

// ─── Middleware ───────────────────────────────────────────────────────────────

/// Reject requests without a valid bearer token; otherwise insert the
/// [`Viewer`] and [`Claims`] into request extensions.
pub async fn require_auth(
  State(config): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let token = bearer_token(req.headers()).ok_or(Error::Unauthorized)?;
  let claims = verify_token(&config, token)?;

  req.extensions_mut().insert(Viewer(claims.sub));
  req.extensions_mut().insert(claims);
  Ok(next.run(req).await)
}
