//! Error types and axum `IntoResponse` implementation.

use ashiato_api::error::{core_message, core_status};
use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("not found")]
  NotFound,
  #[error("password hashing failed: {0}")]
  Hash(String),
  #[error("token error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),
  #[error(transparent)]
  Core(#[from] ashiato_core::Error),
}

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::NotFound => StatusCode::NOT_FOUND,
      Error::Hash(_) | Error::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::Core(e) => core_status(e),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
    }

    let message = match &self {
      Error::Core(e) => core_message(e),
      other => other.to_string(),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if let Error::Unauthorized = self {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
