//! JSON REST API for Ashiato.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any store that
//! implements [`PinStore`], [`FriendshipStore`] and [`CommentStore`].
//! Authentication is the caller's responsibility: every route expects a
//! [`Viewer`] request extension identifying the signed-in user.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/v1", ashiato_api::api_router(engine.clone()).layer(auth))
//! ```

pub mod comments;
pub mod error;
pub mod friends;
pub mod pins;
pub mod viewer;

use std::sync::Arc;

use ashiato_core::{
  Engine,
  store::{CommentStore, FriendshipStore, PinStore},
};
use axum::{
  Router,
  routing::{delete, get, post},
};

pub use error::ApiError;
pub use viewer::Viewer;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: PinStore + FriendshipStore + CommentStore + 'static,
{
  Router::new()
    // Pins
    .route("/pins", get(pins::list::<S>).post(pins::create::<S>))
    .route("/pins/{id}", delete(pins::remove::<S>))
    .route("/pins/{id}/comments", get(comments::list::<S>).post(comments::create::<S>))
    // Friends
    .route("/friends", get(friends::list::<S>))
    .route("/friends/{user_id}", get(friends::status::<S>))
    .route("/friends/{user_id}/request", post(friends::request::<S>))
    .route("/friends/{user_id}/accept", post(friends::accept::<S>))
    .with_state(engine)
}
