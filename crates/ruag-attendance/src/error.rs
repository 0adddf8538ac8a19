//! Errors surfaced by the check-in and check-out flows.

use ruag_core::{geo::OutOfRange, token::TokenError};
use thiserror::Error;
use uuid::Uuid;

use crate::location::LocationError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("QR code not recognised")]
  TokenMalformed,

  #[error("QR code has expired; scan the code currently on screen")]
  TokenExpired,

  #[error("location unavailable: {0}")]
  LocationUnavailable(#[from] LocationError),

  #[error("access denied: {0}")]
  OutOfRange(#[from] OutOfRange),

  #[error("a note is required to check out from outside the office")]
  NoteRequired,

  #[error("note must not contain the reserved [REMOTO: marker")]
  NoteInvalid,

  #[error("no check-in recorded today")]
  NotCheckedIn,

  #[error("attendance record {0} not found")]
  RecordNotFound(Uuid),

  #[error("store error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<TokenError> for Error {
  fn from(e: TokenError) -> Self {
    match e {
      TokenError::Malformed => Self::TokenMalformed,
      TokenError::Expired => Self::TokenExpired,
    }
  }
}

impl Error {
  pub(crate) fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }

  /// Stable machine-readable code.
  pub fn code(&self) -> &'static str {
    match self {
      Self::TokenMalformed => "TOKEN_MALFORMED",
      Self::TokenExpired => "TOKEN_EXPIRED",
      Self::LocationUnavailable(_) => "LOCATION_UNAVAILABLE",
      Self::OutOfRange(_) => "OUT_OF_RANGE",
      Self::NoteRequired => "NOTE_REQUIRED",
      Self::NoteInvalid => "NOTE_INVALID",
      Self::NotCheckedIn => "NOT_CHECKED_IN",
      Self::RecordNotFound(_) => "RECORD_NOT_FOUND",
      Self::Persistence(_) => "PERSISTENCE_ERROR",
    }
  }

  /// User-facing errors that clear on their own and can be retried by
  /// scanning again. Store failures are not retried automatically.
  pub fn is_transient(&self) -> bool {
    matches!(
      self,
      Self::TokenMalformed
        | Self::TokenExpired
        | Self::LocationUnavailable(_)
        | Self::OutOfRange(_)
        | Self::NoteRequired
        | Self::NoteInvalid
    )
  }

  /// Rounded distance for `OUT_OF_RANGE`, if that is what this is.
  pub fn distance_m(&self) -> Option<u64> {
    match self {
      Self::OutOfRange(o) => Some(o.distance_m),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
