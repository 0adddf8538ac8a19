//! Device position acquisition.
//!
//! The device may refuse, may not support positioning at all, or may simply
//! never answer. All three surface as `LOCATION_UNAVAILABLE`; the last is
//! bounded by a timeout.

use std::{future::Future, time::Duration};

use ruag_core::geo::Position;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
  #[error("location permission denied")]
  Denied,
  #[error("device does not support positioning")]
  Unsupported,
  #[error("no position after {0:?}")]
  TimedOut(Duration),
  #[error("{0}")]
  Unavailable(String),
}

/// Source of the device's current position.
pub trait LocationProvider: Send + Sync {
  fn current_position(
    &self,
  ) -> impl Future<Output = Result<Position, LocationError>> + Send + '_;
}

/// A position the client already measured and sent with its request.
/// `None` means the client had none to send.
#[derive(Debug, Clone, Copy)]
pub struct ReportedPosition(pub Option<Position>);

impl LocationProvider for ReportedPosition {
  async fn current_position(&self) -> Result<Position, LocationError> {
    self
      .0
      .ok_or_else(|| LocationError::Unavailable("no position reported".into()))
  }
}

/// Ask `locator` for a position, giving up after `timeout`.
pub async fn locate<L: LocationProvider>(
  locator: &L,
  timeout: Duration,
) -> Result<Position, LocationError> {
  match tokio::time::timeout(timeout, locator.current_position()).await {
    Ok(result) => result,
    Err(_) => Err(LocationError::TimedOut(timeout)),
  }
}
