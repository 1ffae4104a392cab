//! Coordinates, viewports and great-circle distance.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius used for all distance computations.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// ─── Coordinate ──────────────────────────────────────────────────────────────

/// A validated WGS84 point in decimal degrees.
///
/// Deserialising goes through [`Coordinate::new`], so out-of-range input is
/// rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
  pub latitude:  f64,
  pub longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
  latitude:  f64,
  longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
  type Error = Error;

  fn try_from(raw: RawCoordinate) -> Result<Self> { Self::new(raw.latitude, raw.longitude) }
}

impl Coordinate {
  /// Build a coordinate, rejecting non-finite or out-of-range values.
  pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
    if !Self::is_valid(latitude, longitude) {
      return Err(Error::InvalidCoordinates { latitude, longitude });
    }
    Ok(Self { latitude, longitude })
  }

  /// `true` iff both values are finite, latitude is within [-90, 90] and
  /// longitude within [-180, 180].
  pub fn is_valid(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
      && longitude.is_finite()
      && (-90.0..=90.0).contains(&latitude)
      && (-180.0..=180.0).contains(&longitude)
  }

  /// Haversine distance to `other`, in meters.
  pub fn distance_meters(&self, other: &Coordinate) -> f64 {
    haversine_meters(
      self.latitude,
      self.longitude,
      other.latitude,
      other.longitude,
    )
  }
}

/// Great-circle distance between two points on a sphere of radius
/// [`EARTH_RADIUS_METERS`].
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
  let d_lat = (lat2 - lat1).to_radians();
  let d_lng = (lng2 - lng1).to_radians();

  let a = (d_lat / 2.0).sin().powi(2)
    + lat1.to_radians().cos()
      * lat2.to_radians().cos()
      * (d_lng / 2.0).sin().powi(2);

  2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

// ─── Viewport ────────────────────────────────────────────────────────────────

/// The closed lat/lng rectangle a map query is scoped to.
///
/// Only constructible through [`Viewport::new`], so every value satisfies
/// `min < max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
  min_lat: f64,
  max_lat: f64,
  min_lng: f64,
  max_lng: f64,
}

impl Viewport {
  pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Result<Self> {
    let finite = [min_lat, max_lat, min_lng, max_lng]
      .iter()
      .all(|v| v.is_finite());

    if !finite || min_lat >= max_lat || min_lng >= max_lng {
      return Err(Error::InvalidViewport { min_lat, max_lat, min_lng, max_lng });
    }
    Ok(Self { min_lat, max_lat, min_lng, max_lng })
  }

  pub fn min_lat(&self) -> f64 { self.min_lat }

  pub fn max_lat(&self) -> f64 { self.max_lat }

  pub fn min_lng(&self) -> f64 { self.min_lng }

  pub fn max_lng(&self) -> f64 { self.max_lng }

  /// Inclusive on every edge.
  pub fn contains(&self, point: &Coordinate) -> bool {
    (self.min_lat..=self.max_lat).contains(&point.latitude)
      && (self.min_lng..=self.max_lng).contains(&point.longitude)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TOKYO: (f64, f64) = (35.681, 139.767);
  const OSAKA: (f64, f64) = (34.693, 135.502);

  #[test]
  fn rejects_out_of_range_and_non_finite() {
    for (lat, lng) in [
      (90.0001, 0.0),
      (-90.5, 0.0),
      (0.0, 180.01),
      (0.0, -181.0),
      (f64::NAN, 0.0),
      (0.0, f64::NAN),
      (f64::INFINITY, 0.0),
      (0.0, f64::NEG_INFINITY),
    ] {
      assert!(
        matches!(Coordinate::new(lat, lng), Err(Error::InvalidCoordinates { .. })),
        "({lat}, {lng}) should be rejected"
      );
    }
  }

  #[test]
  fn accepts_boundary_values() {
    for (lat, lng) in [(90.0, 180.0), (-90.0, -180.0), (0.0, 0.0)] {
      assert!(Coordinate::new(lat, lng).is_ok());
    }
  }

  #[test]
  fn haversine_is_reflexive() {
    for (lat, lng) in [TOKYO, OSAKA, (90.0, 180.0), (-90.0, -180.0), (0.0, 0.0)] {
      assert_eq!(haversine_meters(lat, lng, lat, lng), 0.0);
    }
  }

  #[test]
  fn haversine_is_symmetric() {
    let there = haversine_meters(TOKYO.0, TOKYO.1, OSAKA.0, OSAKA.1);
    let back = haversine_meters(OSAKA.0, OSAKA.1, TOKYO.0, TOKYO.1);
    assert!((there - back).abs() < 1e-9);
  }

  #[test]
  fn tokyo_to_osaka_is_about_400km() {
    let d = haversine_meters(TOKYO.0, TOKYO.1, OSAKA.0, OSAKA.1);
    assert!((402_000.0..404_000.0).contains(&d), "got {d}");
  }

  #[test]
  fn one_degree_of_latitude() {
    // R * pi / 180
    let d = haversine_meters(0.0, 0.0, 1.0, 0.0);
    assert!((d - 111_194.93).abs() < 0.01, "got {d}");
  }

  #[test]
  fn viewport_requires_strict_bounds() {
    assert!(matches!(
      Viewport::new(35.0, 35.0, 139.0, 140.0),
      Err(Error::InvalidViewport { .. })
    ));
    assert!(matches!(
      Viewport::new(35.0, 36.0, 140.0, 139.0),
      Err(Error::InvalidViewport { .. })
    ));
    assert!(matches!(
      Viewport::new(f64::NAN, 36.0, 139.0, 140.0),
      Err(Error::InvalidViewport { .. })
    ));
    assert!(Viewport::new(35.0, 36.0, 139.0, 140.0).is_ok());
  }

  #[test]
  fn viewport_contains_its_edges() {
    let v = Viewport::new(35.0, 36.0, 139.0, 140.0).unwrap();
    let inside = |lat, lng| v.contains(&Coordinate { latitude: lat, longitude: lng });

    assert!(inside(35.0, 139.0));
    assert!(inside(36.0, 140.0));
    assert!(inside(35.5, 139.5));
    assert!(!inside(34.999, 139.5));
    assert!(!inside(35.5, 140.001));
  }

  #[test]
  fn deserialising_validates_the_range() {
    let ok: Coordinate =
      serde_json::from_str(r#"{"latitude": 35.681, "longitude": 139.767}"#).unwrap();
    assert_eq!(ok, Coordinate { latitude: 35.681, longitude: 139.767 });

    assert!(serde_json::from_str::<Coordinate>(r#"{"latitude": 91.0, "longitude": 0.0}"#).is_err());
    assert!(
      serde_json::from_str::<Coordinate>(r#"{"latitude": 0.0, "longitude": -180.5}"#).is_err()
    );
  }
}
