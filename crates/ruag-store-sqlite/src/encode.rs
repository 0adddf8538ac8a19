//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order equals time order. Dates are
//! `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use ruag_core::{
  achievement::{AchievementId, AchievementUnlock},
  person::{PersonId, Profile},
  record::{AttendanceRecord, CheckInStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// `dt` at the precision it is stored with.
pub fn stored_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `attendance_records` SELECT; must match the
/// field order read in [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "id, person_id, full_name, area, photo_ref, \
   calendar_date, check_in_time, check_in_status, check_out_time, note";

/// Raw strings read directly from an `attendance_records` row.
pub struct RawRecord {
  pub id:              String,
  pub person_id:       String,
  pub full_name:       String,
  pub area:            String,
  pub photo_ref:       Option<String>,
  pub calendar_date:   String,
  pub check_in_time:   String,
  pub check_in_status: String,
  pub check_out_time:  Option<String>,
  pub note:            Option<String>,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      person_id:       row.get(1)?,
      full_name:       row.get(2)?,
      area:            row.get(3)?,
      photo_ref:       row.get(4)?,
      calendar_date:   row.get(5)?,
      check_in_time:   row.get(6)?,
      check_in_status: row.get(7)?,
      check_out_time:  row.get(8)?,
      note:            row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      id:              decode_uuid(&self.id)?,
      person_id:       PersonId::parse(&self.person_id)?,
      full_name:       self.full_name,
      area:            self.area,
      photo_ref:       self.photo_ref,
      calendar_date:   decode_date(&self.calendar_date)?,
      check_in_time:   decode_dt(&self.check_in_time)?,
      check_in_status: self.check_in_status.parse::<CheckInStatus>()?,
      check_out_time:  self.check_out_time.as_deref().map(decode_dt).transpose()?,
      note:            self.note,
    })
  }
}

/// Raw strings read directly from an `achievement_unlocks` row.
pub struct RawUnlock {
  pub person_id:      String,
  pub achievement_id: String,
  pub unlocked_at:    String,
}

impl RawUnlock {
  pub fn into_unlock(self) -> Result<AchievementUnlock> {
    Ok(AchievementUnlock {
      person_id:      PersonId::parse(&self.person_id)?,
      achievement_id: self.achievement_id.parse::<AchievementId>()?,
      unlocked_at:    decode_dt(&self.unlocked_at)?,
    })
  }
}

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub person_id: String,
  pub full_name: String,
  pub area:      String,
  pub photo_ref: Option<String>,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      person_id: PersonId::parse(&self.person_id)?,
      full_name: self.full_name,
      area:      self.area,
      photo_ref: self.photo_ref,
    })
  }
}
