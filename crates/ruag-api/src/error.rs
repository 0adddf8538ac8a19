//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": CODE, "message": text}`, plus
//! `"distance_m"` when a position was outside the geofence.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(#[from] ruag_core::Error),

  #[error(transparent)]
  Attendance(#[from] ruag_attendance::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    use ruag_attendance::Error as A;
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Attendance(e) => match e {
        A::TokenMalformed
        | A::TokenExpired
        | A::LocationUnavailable(_)
        | A::NoteRequired
        | A::NoteInvalid => StatusCode::UNPROCESSABLE_ENTITY,
        A::OutOfRange(_) => StatusCode::FORBIDDEN,
        A::NotCheckedIn => StatusCode::CONFLICT,
        A::RecordNotFound(_) => StatusCode::NOT_FOUND,
        A::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "NOT_FOUND",
      Self::BadRequest(_) => "BAD_REQUEST",
      Self::Store(_) => "PERSISTENCE_ERROR",
      Self::Attendance(e) => e.code(),
    }
  }
}

#[derive(Serialize)]
struct ErrorBody {
  error:      &'static str,
  message:    String,
  #[serde(skip_serializing_if = "Option::is_none")]
  distance_m: Option<u64>,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = ErrorBody {
      error:      self.code(),
      message:    self.to_string(),
      distance_m: match &self {
        Self::Attendance(e) => e.distance_m(),
        _ => None,
      },
    };
    (status, Json(body)).into_response()
  }
}
