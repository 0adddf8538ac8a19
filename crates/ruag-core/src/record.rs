//! Attendance records: one per person per local calendar day.
//!
//! A record is created at the first validated check-in of the day and is
//! afterwards only ever touched to stamp the departure (and its note). The
//! "one per person per day" rule is a `UNIQUE` constraint in the backing
//! store, not something this crate can guarantee on its own.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, note::RemoteNote, person::{PersonId, Profile}};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInStatus {
  OnTime,
  Late,
}

impl CheckInStatus {
  /// The string stored in the `check_in_status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::OnTime => "ON_TIME",
      Self::Late => "LATE",
    }
  }
}

impl fmt::Display for CheckInStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for CheckInStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "ON_TIME" => Ok(Self::OnTime),
      "LATE" => Ok(Self::Late),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  /// Store-assigned identity.
  pub id:              Uuid,
  pub person_id:       PersonId,
  pub full_name:       String,
  pub area:            String,
  pub photo_ref:       Option<String>,
  /// The site-local civil day this record belongs to.
  pub calendar_date:   NaiveDate,
  pub check_in_time:   DateTime<Utc>,
  pub check_in_status: CheckInStatus,
  pub check_out_time:  Option<DateTime<Utc>>,
  /// Free text; for remote departures it carries the encoded position.
  pub note:            Option<String>,
}

impl AttendanceRecord {
  pub fn is_checked_out(&self) -> bool { self.check_out_time.is_some() }

  /// Decode the note as a remote departure, if it is one.
  pub fn remote_checkout(&self) -> Option<RemoteNote> {
    self.note.as_deref().and_then(RemoteNote::parse)
  }
}

/// Input to [`crate::store::AttendanceStore::create_record`]. The store
/// assigns the id.
#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
  pub person_id:       PersonId,
  pub full_name:       String,
  pub area:            String,
  pub photo_ref:       Option<String>,
  pub calendar_date:   NaiveDate,
  pub check_in_time:   DateTime<Utc>,
  pub check_in_status: CheckInStatus,
}

impl NewAttendanceRecord {
  /// Copy the profile snapshot onto a new record.
  pub fn from_profile(
    profile: &Profile,
    calendar_date: NaiveDate,
    check_in_time: DateTime<Utc>,
    check_in_status: CheckInStatus,
  ) -> Self {
    Self {
      person_id: profile.person_id.clone(),
      full_name: profile.full_name.clone(),
      area: profile.area.clone(),
      photo_ref: profile.photo_ref.clone(),
      calendar_date,
      check_in_time,
      check_in_status,
    }
  }
}

// ─── Per-day state ───────────────────────────────────────────────────────────

/// Where a person stands for one day. Transitions only move forward:
/// `NotCheckedIn → CheckedIn → CheckedOut`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "record", rename_all = "snake_case")]
pub enum DayState {
  NotCheckedIn,
  CheckedIn(AttendanceRecord),
  CheckedOut(AttendanceRecord),
}

impl DayState {
  pub fn from_record(record: Option<AttendanceRecord>) -> Self {
    match record {
      None => Self::NotCheckedIn,
      Some(r) if r.is_checked_out() => Self::CheckedOut(r),
      Some(r) => Self::CheckedIn(r),
    }
  }

  pub fn record(&self) -> Option<&AttendanceRecord> {
    match self {
      Self::NotCheckedIn => None,
      Self::CheckedIn(r) | Self::CheckedOut(r) => Some(r),
    }
  }
}

// ─── Daily summary ───────────────────────────────────────────────────────────

/// Head-counts for one day's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
  pub date:             NaiveDate,
  pub total:            usize,
  pub on_time:          usize,
  pub late:             usize,
  pub checked_out:      usize,
  pub remote_checkouts: usize,
}

impl DaySummary {
  pub fn from_roster(date: NaiveDate, roster: &[AttendanceRecord]) -> Self {
    let mut summary = Self {
      date,
      total: 0,
      on_time: 0,
      late: 0,
      checked_out: 0,
      remote_checkouts: 0,
    };
    for record in roster {
      summary.total += 1;
      match record.check_in_status {
        CheckInStatus::OnTime => summary.on_time += 1,
        CheckInStatus::Late => summary.late += 1,
      }
      if record.is_checked_out() {
        summary.checked_out += 1;
      }
      if record.remote_checkout().is_some() {
        summary.remote_checkouts += 1;
      }
    }
    summary
  }
}
