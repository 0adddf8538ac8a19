//! Great-circle distance and the circular geofence around the office.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the haversine formula, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Position {
  pub const fn new(latitude: f64, longitude: f64) -> Self {
    Self { latitude, longitude }
  }
}

/// The position was outside the permitted radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{distance_m} m away from the office")]
pub struct OutOfRange {
  /// Distance rounded to the nearest whole metre, for user messaging.
  pub distance_m: u64,
}

/// Haversine distance between two coordinates, in metres.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
  let d_lat = (lat2 - lat1).to_radians();
  let d_lon = (lon2 - lon1).to_radians();
  let a = (d_lat / 2.0).sin().powi(2)
    + lat1.to_radians().cos()
      * lat2.to_radians().cos()
      * (d_lon / 2.0).sin().powi(2);
  let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
  EARTH_RADIUS_M * c
}

/// Boundary inclusive: a point exactly on the radius is inside.
pub fn is_within(distance: f64, radius_m: f64) -> bool { distance <= radius_m }

/// A circle of `radius_m` metres around `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
  pub center:   Position,
  pub radius_m: f64,
}

impl Geofence {
  pub fn distance_to(&self, position: Position) -> f64 {
    distance_meters(
      position.latitude,
      position.longitude,
      self.center.latitude,
      self.center.longitude,
    )
  }

  /// Accept `position` if it lies within the fence.
  pub fn check(&self, position: Position) -> Result<(), OutOfRange> {
    let distance = self.distance_to(position);
    check_distance(distance, self.radius_m)
  }
}

/// Compare an already-computed distance against the radius.
pub fn check_distance(distance: f64, radius_m: f64) -> Result<(), OutOfRange> {
  if is_within(distance, radius_m) {
    Ok(())
  } else {
    Err(OutOfRange { distance_m: distance.round() as u64 })
  }
}
