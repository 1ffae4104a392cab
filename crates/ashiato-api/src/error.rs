//! API error type and [`axum::response::IntoResponse`] implementation.

use ashiato_core::Error as CoreError;
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthorized,

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Core(e) => core_status(e),
    }
  }
}

/// HTTP status for a core error.
pub fn core_status(e: &CoreError) -> StatusCode {
  match e {
    CoreError::InvalidCoordinates { .. }
    | CoreError::InvalidViewport { .. }
    | CoreError::SelfFriendship
    | CoreError::EmptyComment => StatusCode::BAD_REQUEST,
    CoreError::LocationDeviation { .. } => StatusCode::FORBIDDEN,
    CoreError::AlreadyExists { .. } | CoreError::NoPendingRequest => StatusCode::CONFLICT,
    CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
    CoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
  }
}

/// Body text sent in place of a storage backend's own message.
pub const STORAGE_UNAVAILABLE_MESSAGE: &str = "storage unavailable, try again later";

/// Client-facing text for a core error.
///
/// Storage failures are logged with their source and reported generically.
pub fn core_message(e: &CoreError) -> String {
  match e {
    CoreError::StorageUnavailable(source) => {
      tracing::error!(error = %source, "storage unavailable");
      STORAGE_UNAVAILABLE_MESSAGE.to_string()
    }
    other => other.to_string(),
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Core(e) => core_message(e),
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use ashiato_core::friendship::FriendshipStatus;

  use super::*;

  fn status_of(e: CoreError) -> StatusCode { ApiError::from(e).status() }

  #[test]
  fn core_errors_map_to_statuses() {
    assert_eq!(
      status_of(CoreError::InvalidCoordinates { latitude: 91.0, longitude: 0.0 }),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      status_of(CoreError::LocationDeviation { distance_meters: 9000, limit_meters: 5000 }),
      StatusCode::FORBIDDEN
    );
    assert_eq!(
      status_of(CoreError::AlreadyExists { status: FriendshipStatus::Pending }),
      StatusCode::CONFLICT
    );
    assert_eq!(status_of(CoreError::NoPendingRequest), StatusCode::CONFLICT);
    assert_eq!(status_of(CoreError::SelfFriendship), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(CoreError::EmptyComment), StatusCode::BAD_REQUEST);
    assert_eq!(
      status_of(CoreError::NotFound { kind: "pin", id: "x".into() }),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      status_of(CoreError::StorageUnavailable("disk on fire".into())),
      StatusCode::SERVICE_UNAVAILABLE
    );
  }

  #[test]
  fn deviation_message_reaches_the_client() {
    let e = ApiError::from(CoreError::LocationDeviation {
      distance_meters: 402_819,
      limit_meters:    5000,
    });
    assert!(e.to_string().contains("402819m"));
    assert_eq!(e.into_response().status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn storage_failure_body_hides_the_backend() {
    let e = ApiError::from(CoreError::StorageUnavailable(
      "database error: disk I/O error at /var/lib/ashiato/ashiato.db".into(),
    ));
    let res = e.into_response();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], STORAGE_UNAVAILABLE_MESSAGE);
    assert!(!bytes.windows(4).any(|w| w == b"disk"));
  }
}
