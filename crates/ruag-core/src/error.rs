//! Error types for `ruag-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid person id {0:?}: expected 8 digits")]
  InvalidPersonId(String),

  #[error("invalid profile: {0}")]
  InvalidProfile(String),

  #[error("invalid clock time {0:?}: expected HH:MM")]
  InvalidClockTime(String),

  #[error("invalid UTC offset: {0} minutes")]
  InvalidUtcOffset(i32),

  #[error("invalid policy: {0}")]
  InvalidPolicy(String),

  #[error("unknown check-in status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown achievement: {0:?}")]
  UnknownAchievement(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
