//! The authenticated user a request acts on behalf of.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Inserted into request extensions by the server's auth middleware and
/// extracted by every handler. Missing means the middleware did not run,
/// which is reported as `401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Viewer>()
      .copied()
      .ok_or(ApiError::Unauthorized)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  #[tokio::test]
  async fn reads_the_extension() {
    let id = Uuid::new_v4();
    let (mut parts, ()) = Request::builder()
      .extension(Viewer(id))
      .body(())
      .unwrap()
      .into_parts();

    let viewer = Viewer::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(viewer, Viewer(id));
  }

  #[tokio::test]
  async fn missing_extension_is_unauthorized() {
    let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
    assert!(matches!(
      Viewer::from_request_parts(&mut parts, &()).await,
      Err(ApiError::Unauthorized)
    ));
  }
}
