//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! and a `Z` suffix, so text comparison orders them chronologically. UUIDs
//! are stored as hyphenated lowercase strings.

use ashiato_core::{
  comment::Comment,
  friendship::{Friendship, FriendshipStatus},
  geo::Coordinate,
  pin::{Pin, PinStatus, PrivacyMode},
  store::PinCandidate,
  user::User,
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_privacy(p: PrivacyMode) -> &'static str { p.as_str() }

pub fn decode_privacy(s: &str) -> Result<PrivacyMode> {
  match s {
    "public" => Ok(PrivacyMode::Public),
    "friends" => Ok(PrivacyMode::Friends),
    other => Err(unknown("privacy_setting", other)),
  }
}

pub fn encode_pin_status(s: PinStatus) -> &'static str {
  match s {
    PinStatus::Active => "active",
    PinStatus::Removed => "removed",
  }
}

pub fn decode_pin_status(s: &str) -> Result<PinStatus> {
  match s {
    "active" => Ok(PinStatus::Active),
    "removed" => Ok(PinStatus::Removed),
    other => Err(unknown("pin status", other)),
  }
}

pub fn encode_friendship_status(s: FriendshipStatus) -> &'static str { s.as_str() }

pub fn decode_friendship_status(s: &str) -> Result<FriendshipStatus> {
  match s {
    "pending" => Ok(FriendshipStatus::Pending),
    "accepted" => Ok(FriendshipStatus::Accepted),
    "blocked" => Ok(FriendshipStatus::Blocked),
    other => Err(unknown("friendship status", other)),
  }
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownValue { column, value: value.to_owned() }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PIN_COLUMNS: &str = "p.pin_id, p.owner_id, p.latitude, p.longitude, \
   p.content_text, p.media_url, p.privacy_setting, p.status, p.created_at";

/// Raw values read directly from a `pins` row.
pub struct RawPin {
  pub pin_id:          String,
  pub owner_id:        String,
  pub latitude:        f64,
  pub longitude:       f64,
  pub content_text:    String,
  pub media_url:       Option<String>,
  pub privacy_setting: String,
  pub status:          String,
  pub created_at:      String,
}

impl RawPin {
  /// Read the [`PIN_COLUMNS`] starting at column 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      pin_id:          row.get(0)?,
      owner_id:        row.get(1)?,
      latitude:        row.get(2)?,
      longitude:       row.get(3)?,
      content_text:    row.get(4)?,
      media_url:       row.get(5)?,
      privacy_setting: row.get(6)?,
      status:          row.get(7)?,
      created_at:      row.get(8)?,
    })
  }

  pub fn into_pin(self) -> Result<Pin> {
    Ok(Pin {
      pin_id:          decode_uuid(&self.pin_id)?,
      owner_id:        decode_uuid(&self.owner_id)?,
      coordinate:      Coordinate { latitude: self.latitude, longitude: self.longitude },
      content_text:    self.content_text,
      media_url:       self.media_url,
      privacy_setting: decode_privacy(&self.privacy_setting)?,
      status:          decode_pin_status(&self.status)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// A `pins` row left-joined with the viewer's friendship status.
pub struct RawCandidate {
  pub pin:        RawPin,
  pub friendship: Option<String>,
}

impl RawCandidate {
  pub fn into_candidate(self) -> Result<PinCandidate> {
    Ok(PinCandidate {
      pin:        self.pin.into_pin()?,
      friendship: self
        .friendship
        .as_deref()
        .map(decode_friendship_status)
        .transpose()?,
    })
  }
}

pub const FRIENDSHIP_COLUMNS: &str =
  "user_a_id, user_b_id, status, action_user_id, created_at, updated_at";

/// Raw strings read directly from a `friendships` row.
pub struct RawFriendship {
  pub user_a_id:      String,
  pub user_b_id:      String,
  pub status:         String,
  pub action_user_id: String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawFriendship {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_a_id:      row.get(0)?,
      user_b_id:      row.get(1)?,
      status:         row.get(2)?,
      action_user_id: row.get(3)?,
      created_at:     row.get(4)?,
      updated_at:     row.get(5)?,
    })
  }

  pub fn into_friendship(self) -> Result<Friendship> {
    Ok(Friendship {
      user_a_id:      decode_uuid(&self.user_a_id)?,
      user_b_id:      decode_uuid(&self.user_b_id)?,
      status:         decode_friendship_status(&self.status)?,
      action_user_id: decode_uuid(&self.action_user_id)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub const USER_COLUMNS: &str = "user_id, username, email, password_hash, \
   profile_image_url, bio, created_at, updated_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:           String,
  pub username:          String,
  pub email:             String,
  pub password_hash:     String,
  pub profile_image_url: Option<String>,
  pub bio:               String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:           row.get(0)?,
      username:          row.get(1)?,
      email:             row.get(2)?,
      password_hash:     row.get(3)?,
      profile_image_url: row.get(4)?,
      bio:               row.get(5)?,
      created_at:        row.get(6)?,
      updated_at:        row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:           decode_uuid(&self.user_id)?,
      username:          self.username,
      email:             self.email,
      password_hash:     self.password_hash,
      profile_image_url: self.profile_image_url,
      bio:               self.bio,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str = "comment_id, pin_id, user_id, content_text, created_at";

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:   String,
  pub pin_id:       String,
  pub user_id:      String,
  pub content_text: String,
  pub created_at:   String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:   row.get(0)?,
      pin_id:       row.get(1)?,
      user_id:      row.get(2)?,
      content_text: row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:   decode_uuid(&self.comment_id)?,
      pin_id:       decode_uuid(&self.pin_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      content_text: self.content_text,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}
