//! Location-integrity gate.
//!
//! A post is rejected when it lands implausibly far from the author's previous
//! pin. The check bounds travel between consecutive posts; it does not look at
//! the time between them.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Error, Result,
  geo::Coordinate,
  pin::Pin,
  store::{PinStore, bounded},
};

/// Maximum plausible distance between two consecutive posts.
pub const DEFAULT_MAX_DRIFT_METERS: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateConfig {
  pub max_drift_meters: f64,
}

impl Default for GateConfig {
  fn default() -> Self { Self { max_drift_meters: DEFAULT_MAX_DRIFT_METERS } }
}

/// Compare `proposed` against the previous pin, if any.
///
/// A first post has no baseline and always passes.
pub fn check_drift(
  config: &GateConfig,
  previous: Option<&Pin>,
  proposed: &Coordinate,
) -> Result<()> {
  let Some(previous) = previous else {
    return Ok(());
  };

  let distance = previous.coordinate.distance_meters(proposed);
  if distance > config.max_drift_meters {
    return Err(Error::LocationDeviation {
      distance_meters: distance.round() as u64,
      limit_meters:    config.max_drift_meters.round() as u64,
    });
  }
  Ok(())
}

pub struct LocationGate<S> {
  store:   Arc<S>,
  config:  GateConfig,
  timeout: Duration,
}

impl<S> Clone for LocationGate<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: self.config, timeout: self.timeout }
  }
}

impl<S: PinStore> LocationGate<S> {
  pub fn new(store: Arc<S>, config: GateConfig, timeout: Duration) -> Self {
    Self { store, config, timeout }
  }

  pub fn config(&self) -> &GateConfig { &self.config }

  /// Decide whether `user` may post at (`latitude`, `longitude`).
  ///
  /// Returns the validated coordinate on success. This is a read-only check;
  /// [`crate::posting::PinService::post`] repeats it inside the insert
  /// transaction.
  pub async fn validate(&self, user: Uuid, latitude: f64, longitude: f64) -> Result<Coordinate> {
    let proposed = Coordinate::new(latitude, longitude)?;

    let previous =
      bounded(self.timeout, "most_recent_pin", self.store.most_recent_pin(user)).await?;

    if let Err(e) = check_drift(&self.config, previous.as_ref(), &proposed) {
      tracing::warn!(%user, latitude, longitude, "location gate rejected post: {e}");
      return Err(e);
    }
    Ok(proposed)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::pin::{PinStatus, PrivacyMode};

  fn pin_at(latitude: f64, longitude: f64) -> Pin {
    Pin {
      pin_id:          Uuid::new_v4(),
      owner_id:        Uuid::new_v4(),
      coordinate:      Coordinate { latitude, longitude },
      content_text:    String::new(),
      media_url:       None,
      privacy_setting: PrivacyMode::Public,
      status:          PinStatus::Active,
      created_at:      Utc::now(),
    }
  }

  fn coord(latitude: f64, longitude: f64) -> Coordinate {
    Coordinate::new(latitude, longitude).unwrap()
  }

  #[test]
  fn first_post_passes() {
    assert!(check_drift(&GateConfig::default(), None, &coord(-89.0, 179.0)).is_ok());
  }

  #[test]
  fn nearby_post_passes() {
    let previous = pin_at(35.681, 139.767);
    // ~2.6 km away.
    assert!(check_drift(&GateConfig::default(), Some(&previous), &coord(35.690, 139.740)).is_ok());
  }

  #[test]
  fn far_post_reports_rounded_distance() {
    let previous = pin_at(35.681, 139.767);
    let err = check_drift(&GateConfig::default(), Some(&previous), &coord(34.693, 135.502))
      .unwrap_err();

    match err {
      Error::LocationDeviation { distance_meters, limit_meters } => {
        assert_eq!(distance_meters, 402_819);
        assert_eq!(limit_meters, 5000);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn threshold_is_inclusive() {
    let previous = pin_at(0.0, 0.0);
    // 0.0449 degrees of longitude at the equator is ~4993 m, 0.0451 is ~5015 m.
    assert!(check_drift(&GateConfig::default(), Some(&previous), &coord(0.0, 0.0449)).is_ok());
    assert!(check_drift(&GateConfig::default(), Some(&previous), &coord(0.0, 0.0451)).is_err());

    let exact = GateConfig { max_drift_meters: previous.coordinate.distance_meters(&coord(0.0, 0.03)) };
    assert!(check_drift(&exact, Some(&previous), &coord(0.0, 0.03)).is_ok());
  }

  #[test]
  fn config_threshold_is_respected() {
    let previous = pin_at(35.681, 139.767);
    let strict = GateConfig { max_drift_meters: 100.0 };
    assert!(check_drift(&strict, Some(&previous), &coord(35.690, 139.740)).is_err());
  }
}
