//! HTTP server for Ashiato.
//!
//! Wraps the [`ashiato_api`] router with account registration, bearer-token
//! authentication and request tracing, backed by any store implementing the
//! pin, friendship, comment and user traits.

pub mod auth;
pub mod error;
pub mod users;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use ashiato_core::{
  Engine, EngineConfig,
  gate::{DEFAULT_MAX_DRIFT_METERS, GateConfig},
  store::{CommentStore, FriendshipStore, PinStore, UserStore},
};
use axum::{
  Router, middleware,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ASHIATO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  /// HMAC secret for signing access tokens.
  pub jwt_secret:         String,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours:    u32,
  #[serde(default = "default_max_drift_meters")]
  pub max_drift_meters:   f64,
  #[serde(default = "default_storage_timeout_ms")]
  pub storage_timeout_ms: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_token_ttl_hours() -> u32 { 24 }
fn default_max_drift_meters() -> f64 { DEFAULT_MAX_DRIFT_METERS }
fn default_storage_timeout_ms() -> u64 { 5000 }

impl ServerConfig {
  pub fn engine_config(&self) -> EngineConfig {
    EngineConfig {
      gate:            GateConfig { max_drift_meters: self.max_drift_meters },
      storage_timeout: Duration::from_millis(self.storage_timeout_ms),
    }
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      jwt_secret: self.jwt_secret.clone(),
      token_ttl:  chrono::Duration::hours(i64::from(self.token_ttl_hours)),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the account handlers.
pub struct AppState<S> {
  pub engine:          Arc<Engine<S>>,
  pub store:           Arc<S>,
  pub auth:            Arc<AuthConfig>,
  pub storage_timeout: Duration,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      engine:          Arc::clone(&self.engine),
      store:           Arc::clone(&self.store),
      auth:            Arc::clone(&self.auth),
      storage_timeout: self.storage_timeout,
    }
  }
}

impl<S: PinStore + FriendshipStore + CommentStore> AppState<S> {
  pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
    let engine_config = config.engine_config();
    Self {
      engine:          Arc::new(Engine::new(Arc::clone(&store), engine_config)),
      store,
      auth:            Arc::new(config.auth_config()),
      storage_timeout: engine_config.storage_timeout,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full `/v1` router.
///
/// `/v1/auth/*` is public; everything else requires a bearer token.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PinStore + FriendshipStore + CommentStore + UserStore + 'static,
{
  let public = Router::new()
    .route("/auth/register", post(users::register::<S>))
    .route("/auth/login", post(users::login::<S>))
    .with_state(state.clone());

  let protected = Router::new()
    .route("/me", get(users::me::<S>))
    .with_state(state.clone())
    .merge(ashiato_api::api_router(Arc::clone(&state.engine)))
    .route_layer(middleware::from_fn_with_state(
      Arc::clone(&state.auth),
      auth::require_auth,
    ));

  Router::new()
    .nest("/v1", public.merge(protected))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
