//! Storage traits and supporting row types.
//!
//! The traits are implemented by storage backends (e.g.
//! `ashiato-store-sqlite`). The services in this crate and the HTTP layers
//! depend on these abstractions, not on any concrete backend.

use std::{
  future::Future,
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error,
  comment::Comment,
  friendship::{CanonicalPair, Friendship, FriendshipStatus},
  geo::Viewport,
  pin::{Pin, PinStatus, PrivacyMode},
  user::User,
};

// ─── Row types ───────────────────────────────────────────────────────────────

/// A pin inside a viewport together with the status of the friendship
/// between its owner and the viewer, if one exists.
#[derive(Debug, Clone)]
pub struct PinCandidate {
  pub pin:        Pin,
  pub friendship: Option<FriendshipStatus>,
}

/// The instant by which a store write must commit.
///
/// Writes are not abandoned by the caller once issued; instead the backend
/// checks the deadline immediately before committing and rolls back if it
/// has passed. A write reported as failed therefore never took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
  pub fn after(timeout: Duration) -> Self { Self(Instant::now() + timeout) }

  pub fn has_passed(&self) -> bool { Instant::now() >= self.0 }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error type for every storage trait of a backend.
///
/// All methods on the storage traits return `Send` futures so they can be
/// driven from multi-threaded runtimes (e.g. tokio with `axum`).
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

pub trait PinStore: Store {
  /// Atomically read the owner's most recent pin, run `guard` against it and
  /// insert `pin` only if the guard passes.
  ///
  /// No other insert for the same owner may interleave between the read and
  /// the write. The outer `Result` is a storage failure; the inner one is the
  /// guard's verdict. Nothing is written if `deadline` passes first.
  fn insert_pin_guarded<G>(
    &self,
    pin: Pin,
    guard: G,
    deadline: Deadline,
  ) -> impl Future<Output = Result<crate::Result<Pin>, Self::Error>> + Send + '_
  where
    G: FnOnce(Option<&Pin>) -> crate::Result<()> + Send + 'static;

  /// The owner's pin with the latest `created_at` (ties: greatest `pin_id`),
  /// whatever its status.
  fn most_recent_pin(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Option<Pin>, Self::Error>> + Send + '_;

  /// Active pins inside `viewport` whose privacy mode equals `privacy`,
  /// joined with the friendship between their owner and `viewer`.
  ///
  /// Backends may pre-filter on authorization; callers must not rely on it.
  fn pins_in_viewport(
    &self,
    viewer: Uuid,
    viewport: Viewport,
    privacy: PrivacyMode,
  ) -> impl Future<Output = Result<Vec<PinCandidate>, Self::Error>> + Send + '_;

  fn get_pin(
    &self,
    pin_id: Uuid,
  ) -> impl Future<Output = Result<Option<Pin>, Self::Error>> + Send + '_;

  /// Returns `false` if no pin has `pin_id`.
  fn set_pin_status(
    &self,
    pin_id: Uuid,
    status: PinStatus,
    deadline: Deadline,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

pub trait FriendshipStore: Store {
  fn get_friendship(
    &self,
    pair: CanonicalPair,
  ) -> impl Future<Output = Result<Option<Friendship>, Self::Error>> + Send + '_;

  /// Insert a new row. Returns `false` when a row for the pair already exists
  /// (uniqueness violation) instead of failing.
  fn insert_friendship(
    &self,
    friendship: Friendship,
    deadline: Deadline,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Move the pair from `from` to `to`, recording `actor`. Returns `None` if
  /// no row for the pair currently has status `from`.
  fn update_friendship_status(
    &self,
    pair: CanonicalPair,
    from: FriendshipStatus,
    to: FriendshipStatus,
    actor: Uuid,
    at: DateTime<Utc>,
    deadline: Deadline,
  ) -> impl Future<Output = Result<Option<Friendship>, Self::Error>> + Send + '_;

  /// Ids of every user with an accepted friendship with `user`.
  fn accepted_friends(
    &self,
    user: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;
}

pub trait UserStore: Store {
  /// Returns `false` if the username or email is already taken.
  fn insert_user(
    &self,
    user: User,
    deadline: Deadline,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;
}

pub trait CommentStore: Store {
  fn insert_comment(
    &self,
    comment: Comment,
    deadline: Deadline,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Comments on `pin_id`, oldest first.
  fn comments_on_pin(
    &self,
    pin_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}

// ─── Deadlines ───────────────────────────────────────────────────────────────

/// Drive a store read under `timeout`.
///
/// Backend errors and elapsed deadlines both become
/// [`Error::StorageUnavailable`]. Dropping a read on timeout is harmless;
/// writes go through [`committed`] instead.
pub async fn bounded<T, E, F>(timeout: Duration, op: &'static str, call: F) -> crate::Result<T>
where
  F: Future<Output = Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(timeout, call).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(e)) => {
      tracing::error!(op, error = %e, "store call failed");
      Err(Error::StorageUnavailable(Box::new(e)))
    }
    Err(elapsed) => {
      tracing::error!(op, ?timeout, "store call timed out");
      Err(Error::StorageUnavailable(Box::new(elapsed)))
    }
  }
}

/// Drive a store write to completion.
///
/// The write carries its own [`Deadline`], enforced by the backend before
/// commit, so it is awaited rather than dropped. Backend errors, including a
/// passed deadline, become [`Error::StorageUnavailable`].
pub async fn committed<T, E, F>(op: &'static str, call: F) -> crate::Result<T>
where
  F: Future<Output = Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  call.await.map_err(|e| {
    tracing::error!(op, error = %e, "store write failed");
    Error::StorageUnavailable(Box::new(e))
  })
}
