//! Handlers for `/attendance` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/attendance/check-in` | Body: [`CheckInBody`]; 201 when created, 200 when already checked in |
//! | `POST` | `/attendance/check-out` | Body: [`CheckOutBody`] |
//! | `GET`  | `/attendance/today/{person_id}` | Day state |
//! | `GET`  | `/attendance` | Optional `?date=YYYY-MM-DD`; latest check-in first |
//! | `GET`  | `/attendance/summary` | Optional `?date=YYYY-MM-DD` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use ruag_attendance::location::ReportedPosition;
use ruag_core::{
  achievement::AchievementUnlock,
  geo::Position,
  record::{AttendanceRecord, DayState, DaySummary},
  store::ProfileStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, AppStore, error::ApiError, parse_person};

// ─── Check-in ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckInBody {
  pub person_id: String,
  /// The payload decoded from the kiosk QR code.
  pub token:     String,
  /// Device position; absent when the device could not provide one.
  pub position:  Option<Position>,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
  pub record:   AttendanceRecord,
  pub created:  bool,
  pub unlocked: Vec<AchievementUnlock>,
}

/// `POST /attendance/check-in`
pub async fn check_in<S: AppStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<CheckInBody>,
) -> Result<(StatusCode, Json<CheckInResponse>), ApiError> {
  let person_id = parse_person(&body.person_id)?;
  let profile = state
    .store()
    .get_profile(person_id.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {person_id} is not registered")))?;

  let outcome = state
    .flow
    .check_in(&profile, &body.token, &ReportedPosition(body.position), Utc::now())
    .await?;

  let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((
    status,
    Json(CheckInResponse {
      record:   outcome.record,
      created:  outcome.created,
      unlocked: outcome.unlocked,
    }),
  ))
}

// ─── Check-out ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CheckOutBody {
  pub person_id: String,
  pub position:  Option<Position>,
  /// Required when checking out from outside the office.
  pub note:      Option<String>,
}

/// `POST /attendance/check-out`
pub async fn check_out<S: AppStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<CheckOutBody>,
) -> Result<Json<AttendanceRecord>, ApiError> {
  let person_id = parse_person(&body.person_id)?;
  let record = state
    .flow
    .check_out_today(
      &person_id,
      &ReportedPosition(body.position),
      Utc::now(),
      body.note.as_deref(),
    )
    .await?;
  Ok(Json(record))
}

// ─── Queries ──────────────────────────────────────────────────────────────────

/// `GET /attendance/today/{person_id}`
pub async fn today<S: AppStore>(
  State(state): State<AppState<S>>,
  Path(person_id): Path<String>,
) -> Result<Json<DayState>, ApiError> {
  let person_id = parse_person(&person_id)?;
  Ok(Json(state.flow.day_state(&person_id, Utc::now()).await?))
}

#[derive(Debug, Deserialize)]
pub struct DateParams {
  /// Site-local calendar day. Defaults to today.
  pub date: Option<NaiveDate>,
}

impl DateParams {
  fn resolve<S: AppStore>(&self, state: &AppState<S>) -> NaiveDate {
    self.date.unwrap_or_else(|| state.flow.today(Utc::now()))
  }
}

/// `GET /attendance[?date=YYYY-MM-DD]`
pub async fn roster<S: AppStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
  let date = params.resolve(&state);
  Ok(Json(state.flow.roster(date).await?))
}

/// `GET /attendance/summary[?date=YYYY-MM-DD]`
pub async fn summary<S: AppStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<DaySummary>, ApiError> {
  let date = params.resolve(&state);
  Ok(Json(state.flow.summary(date).await?))
}
