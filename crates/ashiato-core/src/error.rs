//! Error types for `ashiato-core`.

use thiserror::Error;

use crate::friendship::FriendshipStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
  InvalidCoordinates { latitude: f64, longitude: f64 },

  #[error(
    "location deviation ({distance_meters}m) exceeds the permitted range of \
     {limit_meters}m; please re-verify your location"
  )]
  LocationDeviation {
    /// Great-circle distance from the previous pin, rounded to the meter.
    distance_meters: u64,
    limit_meters:    u64,
  },

  #[error(
    "invalid viewport: latitude [{min_lat}, {max_lat}], longitude \
     [{min_lng}, {max_lng}]"
  )]
  InvalidViewport {
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
  },

  #[error("friendship already exists with status {status}")]
  AlreadyExists { status: FriendshipStatus },

  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: String },

  #[error("cannot send a friend request to oneself")]
  SelfFriendship,

  #[error("no pending friend request to accept")]
  NoPendingRequest,

  #[error("comment text is empty")]
  EmptyComment,

  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
    Self::NotFound { kind, id: id.to_string() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
