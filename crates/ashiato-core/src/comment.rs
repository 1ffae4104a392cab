//! Comments on pins, gated by the same rule that decides pin visibility.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  friendship::CanonicalPair,
  pin::{Pin, PinStatus},
  store::{CommentStore, Deadline, FriendshipStore, PinStore, bounded, committed},
  visibility::is_authorized,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:   Uuid,
  pub pin_id:       Uuid,
  pub user_id:      Uuid,
  pub content_text: String,
  pub created_at:   DateTime<Utc>,
}

pub struct CommentService<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S> Clone for CommentService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store), timeout: self.timeout } }
}

impl<S: PinStore + FriendshipStore + CommentStore> CommentService<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  /// The pin `viewer` wants to read or comment on.
  ///
  /// Missing, removed and unauthorized pins are all [`Error::NotFound`], so
  /// a friends-only pin's existence is not revealed.
  async fn visible_pin(&self, viewer: Uuid, pin_id: Uuid) -> Result<Pin> {
    let pin = bounded(self.timeout, "get_pin", self.store.get_pin(pin_id))
      .await?
      .filter(|pin| pin.status == PinStatus::Active)
      .ok_or_else(|| Error::not_found("pin", pin_id))?;

    let friendship = match CanonicalPair::new(viewer, pin.owner_id) {
      Some(pair) => bounded(self.timeout, "get_friendship", self.store.get_friendship(pair))
        .await?
        .map(|f| f.status),
      None => None,
    };

    if !is_authorized(viewer, &pin, friendship) {
      return Err(Error::not_found("pin", pin_id));
    }
    Ok(pin)
  }

  /// Add a comment by `author` to a pin they can see.
  pub async fn comment(&self, author: Uuid, pin_id: Uuid, content_text: &str) -> Result<Comment> {
    let content_text = content_text.trim();
    if content_text.is_empty() {
      return Err(Error::EmptyComment);
    }
    self.visible_pin(author, pin_id).await?;

    let comment = Comment {
      comment_id:   Uuid::new_v4(),
      pin_id,
      user_id:      author,
      content_text: content_text.to_string(),
      created_at:   crate::now(),
    };
    committed(
      "insert_comment",
      self.store.insert_comment(comment.clone(), Deadline::after(self.timeout)),
    )
    .await?;

    tracing::info!(comment_id = %comment.comment_id, %pin_id, %author, "comment created");
    Ok(comment)
  }

  /// Comments on a pin `viewer` can see, oldest first.
  pub async fn comments(&self, viewer: Uuid, pin_id: Uuid) -> Result<Vec<Comment>> {
    self.visible_pin(viewer, pin_id).await?;
    bounded(self.timeout, "comments_on_pin", self.store.comments_on_pin(pin_id)).await
  }
}
