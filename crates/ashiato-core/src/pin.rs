//! Pins: user-authored, geotagged posts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// Who may see a pin besides its author.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyMode {
  #[default]
  Public,
  /// Only the author and users with an accepted friendship.
  Friends,
}

impl PrivacyMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Public => "public",
      Self::Friends => "friends",
    }
  }
}

impl fmt::Display for PrivacyMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinStatus {
  Active,
  Removed,
}

/// A persisted pin. Nothing but `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
  pub pin_id:          Uuid,
  pub owner_id:        Uuid,
  #[serde(flatten)]
  pub coordinate:      Coordinate,
  pub content_text:    String,
  pub media_url:       Option<String>,
  pub privacy_setting: PrivacyMode,
  pub status:          PinStatus,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::posting::PinService::post`]. The id, status and
/// timestamp are assigned by the service.
#[derive(Debug, Clone)]
pub struct NewPin {
  pub latitude:        f64,
  pub longitude:       f64,
  pub content_text:    String,
  pub media_url:       Option<String>,
  pub privacy_setting: PrivacyMode,
}

impl NewPin {
  /// A public pin without media.
  pub fn new(latitude: f64, longitude: f64, content_text: impl Into<String>) -> Self {
    Self {
      latitude,
      longitude,
      content_text: content_text.into(),
      media_url: None,
      privacy_setting: PrivacyMode::default(),
    }
  }

  pub fn with_privacy(mut self, privacy_setting: PrivacyMode) -> Self {
    self.privacy_setting = privacy_setting;
    self
  }
}
