//! Friendship oracle: pair lookup and the request/accept workflow.
//!
//! Every entry point normalises its arguments through [`CanonicalPair`], so
//! callers never need to know the storage order.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Error, Result,
  friendship::{CanonicalPair, Friendship, FriendshipStatus},
  store::{Deadline, FriendshipStore, bounded, committed},
};

pub struct FriendshipOracle<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S> Clone for FriendshipOracle<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), timeout: self.timeout } }
}

impl<S: FriendshipStore> FriendshipOracle<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  /// The friendship between `a` and `b`, in either order. A user has no
  /// friendship with themselves.
  pub async fn status(&self, a: Uuid, b: Uuid) -> Result<Option<Friendship>> {
    let Some(pair) = CanonicalPair::new(a, b) else {
      return Ok(None);
    };
    bounded(self.timeout, "get_friendship", self.store.get_friendship(pair)).await
  }

  /// Open a `pending` request from `requester` to `target`.
  ///
  /// Any existing row for the pair, whoever created it and whatever its
  /// status, makes this fail with [`Error::AlreadyExists`].
  pub async fn request(&self, requester: Uuid, target: Uuid) -> Result<Friendship> {
    let pair = CanonicalPair::new(requester, target).ok_or(Error::SelfFriendship)?;

    if let Some(existing) =
      bounded(self.timeout, "get_friendship", self.store.get_friendship(pair)).await?
    {
      return Err(Error::AlreadyExists { status: existing.status });
    }

    let friendship = Friendship::pending(pair, requester, crate::now());
    let inserted = committed(
      "insert_friendship",
      self
        .store
        .insert_friendship(friendship.clone(), Deadline::after(self.timeout)),
    )
    .await?;

    if !inserted {
      // Lost a race with a concurrent request for the same pair.
      let status = bounded(self.timeout, "get_friendship", self.store.get_friendship(pair))
        .await?
        .map_or(FriendshipStatus::Pending, |f| f.status);
      return Err(Error::AlreadyExists { status });
    }

    tracing::info!(%requester, %target, "friend request created");
    Ok(friendship)
  }

  /// Accept the pending request that `requester` sent to `accepter`.
  ///
  /// Fails with [`Error::NotFound`] if the pair has no row, and with
  /// [`Error::NoPendingRequest`] if the row is not pending or the pending
  /// request was sent by `accepter` themselves. Accepting twice is therefore
  /// an error, not a no-op.
  pub async fn accept(&self, accepter: Uuid, requester: Uuid) -> Result<Friendship> {
    let pair = CanonicalPair::new(accepter, requester).ok_or(Error::SelfFriendship)?;

    let existing = bounded(self.timeout, "get_friendship", self.store.get_friendship(pair))
      .await?
      .ok_or_else(|| Error::not_found("friendship", pair))?;

    if existing.status != FriendshipStatus::Pending || existing.action_user_id == accepter {
      return Err(Error::NoPendingRequest);
    }

    let updated = committed(
      "update_friendship_status",
      self.store.update_friendship_status(
        pair,
        FriendshipStatus::Pending,
        FriendshipStatus::Accepted,
        accepter,
        crate::now(),
        Deadline::after(self.timeout),
      ),
    )
    .await?
    .ok_or(Error::NoPendingRequest)?;

    tracing::info!(%accepter, %requester, "friend request accepted");
    Ok(updated)
  }

  /// Ids of `user`'s accepted friends.
  pub async fn friends_of(&self, user: Uuid) -> Result<Vec<Uuid>> {
    bounded(self.timeout, "accepted_friends", self.store.accepted_friends(user)).await
  }
}
