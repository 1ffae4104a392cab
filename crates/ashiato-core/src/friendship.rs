//! Friendships and the canonical pair they are keyed by.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
  Pending,
  Accepted,
  /// Reserved; no operation currently produces it.
  Blocked,
}

impl FriendshipStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Accepted => "accepted",
      Self::Blocked => "blocked",
    }
  }
}

impl fmt::Display for FriendshipStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── CanonicalPair ───────────────────────────────────────────────────────────

/// Two distinct user ids, smaller first.
///
/// UUID ordering matches the lexicographic ordering of their hyphenated
/// lowercase form, so the order is the same in memory and in a text column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalPair {
  low:  Uuid,
  high: Uuid,
}

impl CanonicalPair {
  /// Normalise `(a, b)`. Returns `None` when `a == b`.
  pub fn new(a: Uuid, b: Uuid) -> Option<Self> {
    match a.cmp(&b) {
      std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
      std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
      std::cmp::Ordering::Equal => None,
    }
  }

  pub fn first(&self) -> Uuid { self.low }

  pub fn second(&self) -> Uuid { self.high }

  pub fn contains(&self, user: Uuid) -> bool { self.low == user || self.high == user }

  /// The member of the pair that is not `user`.
  pub fn other(&self, user: Uuid) -> Option<Uuid> {
    if user == self.low {
      Some(self.high)
    } else if user == self.high {
      Some(self.low)
    } else {
      None
    }
  }
}

impl fmt::Display for CanonicalPair {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.low, self.high)
  }
}

// ─── Friendship ──────────────────────────────────────────────────────────────

/// One row per unordered pair of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
  pub user_a_id:      Uuid,
  pub user_b_id:      Uuid,
  pub status:         FriendshipStatus,
  /// The user who performed the most recent transition.
  pub action_user_id: Uuid,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Friendship {
  /// A fresh `pending` row requested by `requester`.
  pub fn pending(pair: CanonicalPair, requester: Uuid, at: DateTime<Utc>) -> Self {
    Self {
      user_a_id:      pair.first(),
      user_b_id:      pair.second(),
      status:         FriendshipStatus::Pending,
      action_user_id: requester,
      created_at:     at,
      updated_at:     at,
    }
  }

  pub fn pair(&self) -> Option<CanonicalPair> {
    CanonicalPair::new(self.user_a_id, self.user_b_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pair_is_order_independent() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    assert_eq!(CanonicalPair::new(a, b), CanonicalPair::new(b, a));
  }

  #[test]
  fn pair_puts_smaller_id_first() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let pair = CanonicalPair::new(a, b).unwrap();
    assert!(pair.first() < pair.second());
    assert!(
      pair.first().hyphenated().to_string() < pair.second().hyphenated().to_string()
    );
  }

  #[test]
  fn pair_rejects_self() {
    let a = Uuid::new_v4();
    assert!(CanonicalPair::new(a, a).is_none());
  }

  #[test]
  fn other_member() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let pair = CanonicalPair::new(a, b).unwrap();
    assert_eq!(pair.other(a), Some(b));
    assert_eq!(pair.other(b), Some(a));
    assert_eq!(pair.other(Uuid::new_v4()), None);
    assert!(pair.contains(a) && pair.contains(b));
  }

  #[test]
  fn pending_records_requester() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let pair = CanonicalPair::new(b, a).unwrap();
    let f = Friendship::pending(pair, b, Utc::now());

    assert_eq!(f.status, FriendshipStatus::Pending);
    assert_eq!(f.action_user_id, b);
    assert_eq!(f.pair(), Some(pair));
    assert!(f.user_a_id < f.user_b_id);
  }
}
