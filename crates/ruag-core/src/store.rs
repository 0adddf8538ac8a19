//! The store traits and their write-conflict signal.
//!
//! The traits are implemented by storage backends (e.g. `ruag-store-sqlite`).
//! Higher layers (`ruag-attendance`, `ruag-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  achievement::{AchievementId, AchievementUnlock},
  person::{PersonId, Profile},
  record::{AttendanceRecord, NewAttendanceRecord},
};

// ─── Conflict signal ─────────────────────────────────────────────────────────

/// Outcome of a create that is guarded by a uniqueness constraint.
///
/// `Conflict` is the expected "someone else already wrote this key" answer and
/// is recoverable by reading the existing row. `Backend` is anything else.
#[derive(Debug, Error)]
pub enum CreateError<E> {
  #[error("a row with the same key already exists")]
  Conflict,
  #[error(transparent)]
  Backend(#[from] E),
}

/// Outcome of [`AttendanceStore::set_check_out`] on an existing record.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutWrite {
  /// The row as stored after the call.
  pub record:  AttendanceRecord,
  /// `false` when the record was already checked out and nothing changed.
  pub applied: bool,
}

// ─── Attendance ──────────────────────────────────────────────────────────────

/// Abstraction over the attendance record and achievement tables.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// Insert the day's record for a person.
  ///
  /// Must fail with [`CreateError::Conflict`] when a record for the same
  /// `(person_id, calendar_date)` already exists.
  ///
  /// The returned record carries the values as stored, so it compares equal
  /// to a later read of the same row.
  fn create_record(
    &self,
    input: NewAttendanceRecord,
  ) -> impl Future<Output = Result<AttendanceRecord, CreateError<Self::Error>>>
  + Send
  + '_;

  /// Retrieve the record for a person on a day. Returns `None` if absent.
  fn find_record(
    &self,
    person_id: PersonId,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>>
  + Send
  + '_;

  /// Stamp the departure on a record that has none yet.
  ///
  /// A record that is already checked out is left untouched; either way the
  /// current row is returned, with `applied` telling the two cases apart.
  /// Returns `None` if the id does not exist.
  fn set_check_out(
    &self,
    id: Uuid,
    check_out_time: DateTime<Utc>,
    note: Option<String>,
  ) -> impl Future<Output = Result<Option<CheckOutWrite>, Self::Error>>
  + Send
  + '_;

  /// All records for a day, latest check-in first.
  fn list_day(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Number of records for a day, across all people.
  fn count_day(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// A person's most recent records, newest calendar day first.
  fn recent_for_person(
    &self,
    person_id: PersonId,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;

  // ── Achievements ──────────────────────────────────────────────────────

  /// Record an unlock.
  ///
  /// Must fail with [`CreateError::Conflict`] when the person already holds
  /// the achievement.
  fn record_unlock(
    &self,
    person_id: PersonId,
    achievement_id: AchievementId,
    unlocked_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<AchievementUnlock, CreateError<Self::Error>>>
  + Send
  + '_;

  /// Every achievement a person holds, oldest unlock first.
  fn list_unlocks(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Vec<AchievementUnlock>, Self::Error>> + Send + '_;
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// The registration cards people create before their first check-in.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create or replace the profile for `profile.person_id`.
  fn upsert_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;
}
