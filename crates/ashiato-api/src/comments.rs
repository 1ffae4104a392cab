//! Handlers for `/pins/:id/comments`.
//!
//! | Method | Path                 | Notes |
//! |--------|----------------------|-------|
//! | `GET`  | `/pins/:id/comments` | Oldest first; 404 if the viewer cannot see the pin |
//! | `POST` | `/pins/:id/comments` | Body: [`NewCommentBody`]; returns 201 + stored comment |

use std::sync::Arc;

use ashiato_core::{
  Engine,
  comment::Comment,
  store::{CommentStore, FriendshipStore, PinStore},
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

#[derive(Debug, Serialize)]
pub struct CommentList {
  pub comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
  pub content_text: String,
}

/// `GET /pins/:id/comments`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Path(pin_id): Path<Uuid>,
) -> Result<Json<CommentList>, ApiError>
where
  S: PinStore + FriendshipStore + CommentStore,
{
  let comments = engine.comments.comments(viewer, pin_id).await?;
  Ok(Json(CommentList { comments }))
}

/// `POST /pins/:id/comments`
pub async fn create<S>(
  State(engine): State<Arc<Engine<S>>>,
  Viewer(viewer): Viewer,
  Path(pin_id): Path<Uuid>,
  Json(body): Json<NewCommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PinStore + FriendshipStore + CommentStore,
{
  let comment = engine.comments.comment(viewer, pin_id, &body.content_text).await?;
  Ok((StatusCode::CREATED, Json(comment)))
}
