//! [`SqliteStore`]: the SQLite implementation of the Ashiato store traits.

use std::path::Path;

use ashiato_core::{
  comment::Comment,
  friendship::{CanonicalPair, Friendship, FriendshipStatus},
  geo::Viewport,
  pin::{Pin, PinStatus, PrivacyMode},
  store::{CommentStore, Deadline, FriendshipStore, PinCandidate, PinStore, Store, UserStore},
  user::User,
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    COMMENT_COLUMNS, FRIENDSHIP_COLUMNS, PIN_COLUMNS, RawCandidate, RawComment,
    RawFriendship, RawPin, RawUser, USER_COLUMNS, decode_uuid, encode_dt, encode_friendship_status,
    encode_pin_status, encode_privacy, encode_uuid,
  },
  schema::SCHEMA,
};

/// `true` for PRIMARY KEY and UNIQUE violations, which the store reports as
/// "already exists" rather than as failures.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  match err {
    rusqlite::Error::SqliteFailure(e, _) => matches!(
      e.extended_code,
      rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    ),
    _ => false,
  }
}

/// The owner's latest pin; ties on `created_at` go to the greatest id.
fn select_most_recent(
  conn: &rusqlite::Connection,
  owner_id: &str,
) -> rusqlite::Result<Option<RawPin>> {
  conn
    .query_row(
      &format!(
        "SELECT {PIN_COLUMNS} FROM pins p
         WHERE p.owner_id = ?1
         ORDER BY p.created_at DESC, p.pin_id DESC
         LIMIT 1"
      ),
      rusqlite::params![owner_id],
      RawPin::from_row,
    )
    .optional()
}

/// Carry a decode failure out of a `call` closure.
fn decode_failure(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

/// Commit `tx` unless `deadline` has passed, in which case it is dropped and
/// rolled back.
fn commit_before(tx: rusqlite::Transaction<'_>, deadline: Deadline) -> tokio_rusqlite::Result<()> {
  if deadline.has_passed() {
    return Err(decode_failure(Error::DeadlineElapsed));
  }
  tx.commit()?;
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Ashiato store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run on one connection thread, and multi-statement operations use explicit
/// transactions.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_friendship(&self, pair: CanonicalPair) -> Result<Option<Friendship>> {
    let a = encode_uuid(pair.first());
    let b = encode_uuid(pair.second());

    let raw: Option<RawFriendship> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {FRIENDSHIP_COLUMNS} FROM friendships
                 WHERE user_a_id = ?1 AND user_b_id = ?2"
              ),
              rusqlite::params![a, b],
              RawFriendship::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFriendship::into_friendship).transpose()
  }

  async fn query_user(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
              rusqlite::params![value],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── PinStore impl ───────────────────────────────────────────────────────────

impl PinStore for SqliteStore {
  async fn insert_pin_guarded<G>(
    &self,
    pin: Pin,
    guard: G,
    deadline: Deadline,
  ) -> Result<ashiato_core::Result<Pin>>
  where
    G: FnOnce(Option<&Pin>) -> ashiato_core::Result<()> + Send + 'static,
  {
    let pin_id_str   = encode_uuid(pin.pin_id);
    let owner_id_str = encode_uuid(pin.owner_id);
    let latitude     = pin.coordinate.latitude;
    let longitude    = pin.coordinate.longitude;
    let content      = pin.content_text.clone();
    let media_url    = pin.media_url.clone();
    let privacy_str  = encode_privacy(pin.privacy_setting);
    let status_str   = encode_pin_status(pin.status);
    let created_str  = encode_dt(pin.created_at);

    let verdict = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the baseline read and
        // the insert see no interleaved writer.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = select_most_recent(&tx, &owner_id_str)?
          .map(RawPin::into_pin)
          .transpose()
          .map_err(decode_failure)?;

        if let Err(rejection) = guard(previous.as_ref()) {
          return Ok(Err(rejection));
        }

        tx.execute(
          "INSERT INTO pins (
             pin_id, owner_id, latitude, longitude, content_text,
             media_url, privacy_setting, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            pin_id_str,
            owner_id_str,
            latitude,
            longitude,
            content,
            media_url,
            privacy_str,
            status_str,
            created_str,
          ],
        )?;
        commit_before(tx, deadline)?;
        Ok(Ok(()))
      })
      .await?;

    Ok(verdict.map(|()| pin))
  }

  async fn most_recent_pin(&self, owner_id: Uuid) -> Result<Option<Pin>> {
    let owner_str = encode_uuid(owner_id);

    let raw: Option<RawPin> = self
      .conn
      .call(move |conn| Ok(select_most_recent(conn, &owner_str)?))
      .await?;

    raw.map(RawPin::into_pin).transpose()
  }

  async fn pins_in_viewport(
    &self,
    viewer: Uuid,
    viewport: Viewport,
    privacy: PrivacyMode,
  ) -> Result<Vec<PinCandidate>> {
    let viewer_str  = encode_uuid(viewer);
    let privacy_str = encode_privacy(privacy);

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        // The friendship join uses the canonical pair: MIN/MAX over the two
        // hyphenated ids gives (user_a_id, user_b_id).
        let mut stmt = conn.prepare(&format!(
          "SELECT {PIN_COLUMNS}, f.status
           FROM pins p
           LEFT JOIN friendships f
             ON f.user_a_id = MIN(p.owner_id, ?1)
            AND f.user_b_id = MAX(p.owner_id, ?1)
           WHERE p.status = 'active'
             AND p.latitude  BETWEEN ?2 AND ?3
             AND p.longitude BETWEEN ?4 AND ?5
             AND p.privacy_setting = ?6
             AND (p.owner_id = ?1 OR p.privacy_setting = 'public' OR f.status = 'accepted')
           ORDER BY p.created_at DESC, p.pin_id DESC"
        ))?;

        let rows = stmt
          .query_map(
            rusqlite::params![
              viewer_str,
              viewport.min_lat(),
              viewport.max_lat(),
              viewport.min_lng(),
              viewport.max_lng(),
              privacy_str,
            ],
            |row| {
              Ok(RawCandidate {
                pin:        RawPin::from_row(row)?,
                friendship: row.get(9)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn get_pin(&self, pin_id: Uuid) -> Result<Option<Pin>> {
    let id_str = encode_uuid(pin_id);

    let raw: Option<RawPin> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PIN_COLUMNS} FROM pins p WHERE p.pin_id = ?1"),
              rusqlite::params![id_str],
              RawPin::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPin::into_pin).transpose()
  }

  async fn set_pin_status(
    &self,
    pin_id: Uuid,
    status: PinStatus,
    deadline: Deadline,
  ) -> Result<bool> {
    let id_str     = encode_uuid(pin_id);
    let status_str = encode_pin_status(status);

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE pins SET status = ?2 WHERE pin_id = ?1",
          rusqlite::params![id_str, status_str],
        )?;
        commit_before(tx, deadline)?;
        Ok(changed)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── FriendshipStore impl ────────────────────────────────────────────────────

impl FriendshipStore for SqliteStore {
  async fn get_friendship(&self, pair: CanonicalPair) -> Result<Option<Friendship>> {
    self.query_friendship(pair).await
  }

  async fn insert_friendship(&self, friendship: Friendship, deadline: Deadline) -> Result<bool> {
    let a_str      = encode_uuid(friendship.user_a_id);
    let b_str      = encode_uuid(friendship.user_b_id);
    let status_str = encode_friendship_status(friendship.status);
    let actor_str  = encode_uuid(friendship.action_user_id);
    let created    = encode_dt(friendship.created_at);
    let updated    = encode_dt(friendship.updated_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = tx.execute(
          "INSERT INTO friendships (
             user_a_id, user_b_id, status, action_user_id, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![a_str, b_str, status_str, actor_str, created, updated],
        );
        match outcome {
          Ok(_) => {
            commit_before(tx, deadline)?;
            Ok(true)
          }
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      tracing::debug!(
        user_a = %friendship.user_a_id,
        user_b = %friendship.user_b_id,
        "friendship insert hit the pair constraint"
      );
    }
    Ok(inserted)
  }

  async fn update_friendship_status(
    &self,
    pair: CanonicalPair,
    from: FriendshipStatus,
    to: FriendshipStatus,
    actor: Uuid,
    at: DateTime<Utc>,
    deadline: Deadline,
  ) -> Result<Option<Friendship>> {
    let a_str     = encode_uuid(pair.first());
    let b_str     = encode_uuid(pair.second());
    let from_str  = encode_friendship_status(from);
    let to_str    = encode_friendship_status(to);
    let actor_str = encode_uuid(actor);
    let at_str    = encode_dt(at);

    let raw: Option<RawFriendship> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE friendships
           SET status = ?4, action_user_id = ?5, updated_at = ?6
           WHERE user_a_id = ?1 AND user_b_id = ?2 AND status = ?3",
          rusqlite::params![a_str, b_str, from_str, to_str, actor_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let row = tx.query_row(
          &format!(
            "SELECT {FRIENDSHIP_COLUMNS} FROM friendships
             WHERE user_a_id = ?1 AND user_b_id = ?2"
          ),
          rusqlite::params![a_str, b_str],
          RawFriendship::from_row,
        )?;
        commit_before(tx, deadline)?;
        Ok(Some(row))
      })
      .await?;

    raw.map(RawFriendship::into_friendship).transpose()
  }

  async fn accepted_friends(&self, user: Uuid) -> Result<Vec<Uuid>> {
    let user_str = encode_uuid(user);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT CASE WHEN user_a_id = ?1 THEN user_b_id ELSE user_a_id END AS friend_id
           FROM friendships
           WHERE (user_a_id = ?1 OR user_b_id = ?1)
             AND status = 'accepted'
           ORDER BY friend_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  async fn insert_user(&self, user: User, deadline: Deadline) -> Result<bool> {
    let id_str  = encode_uuid(user.user_id);
    let created = encode_dt(user.created_at);
    let updated = encode_dt(user.updated_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = tx.execute(
          "INSERT INTO users (
             user_id, username, email, password_hash,
             profile_image_url, bio, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            user.username,
            user.email,
            user.password_hash,
            user.profile_image_url,
            user.bio,
            created,
            updated,
          ],
        );
        match outcome {
          Ok(_) => {
            commit_before(tx, deadline)?;
            Ok(true)
          }
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await
      .map_err(Error::from)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.query_user("user_id", encode_uuid(user_id)).await
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.query_user("email", email.to_owned()).await
  }
}

// ─── CommentStore impl ───────────────────────────────────────────────────────

impl CommentStore for SqliteStore {
  async fn insert_comment(&self, comment: Comment, deadline: Deadline) -> Result<()> {
    let comment_id = encode_uuid(comment.comment_id);
    let pin_id     = encode_uuid(comment.pin_id);
    let user_id    = encode_uuid(comment.user_id);
    let created    = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO comments (comment_id, pin_id, user_id, content_text, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![comment_id, pin_id, user_id, comment.content_text, created],
        )?;
        commit_before(tx, deadline)
      })
      .await?;
    Ok(())
  }

  async fn comments_on_pin(&self, pin_id: Uuid) -> Result<Vec<Comment>> {
    let pin_str = encode_uuid(pin_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments
           WHERE pin_id = ?1
           ORDER BY created_at ASC, comment_id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![pin_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}
