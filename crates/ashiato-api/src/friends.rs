//! Handlers for `/friends` endpoints. All paths are relative to the viewer.
//!
//! | Method | Path                         | Notes |
//! |--------|------------------------------|-------|
//! | `GET`  | `/friends`                   | Ids of accepted friends |
//! | `GET`  | `/friends/:user_id`          | The pair's friendship row, 404 if none |
//! | `POST` | `/friends/:user_id/request`  | Send a request; returns 201 |
//! | `POST` | `/friends/:user_id/accept`   | Accept a request `user_id` sent |

use std::sync::Arc;

use ashiato_core::{
  Engine,
  friendship::Friendship,
  store::{FriendshipStore, PinStore},
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

#[derive(Debug, Serialize)]
pub struct FriendList {
  pub friends: Vec<Uuid>,
}

/// `GET /friends`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
) -> Result<Json<FriendList>, ApiError>
where
  S: PinStore + FriendshipStore,
{
  let friends = engine.oracle.friends_of(viewer).await?;
  Ok(Json(FriendList { friends }))
}

/// `GET /friends/:user_id`
pub async fn status<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Friendship>, ApiError>
where
  S: PinStore + FriendshipStore,
{
  engine
    .oracle
    .status(viewer, user_id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("no friendship with {user_id}")))
}

/// `POST /friends/:user_id/request`
pub async fn request<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PinStore + FriendshipStore,
{
  let friendship = engine.oracle.request(viewer, user_id).await?;
  Ok((StatusCode::CREATED, Json(friendship)))
}

/// `POST /friends/:user_id/accept`
pub async fn accept<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Friendship>, ApiError>
where
  S: PinStore + FriendshipStore,
{
  Ok(Json(engine.oracle.accept(viewer, user_id).await?))
}
