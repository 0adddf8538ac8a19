//! Deployment policy: where the office is, how far away a check-in may be,
//! which local clock it runs on, and when "on time" ends.

use std::{fmt, str::FromStr};

use chrono::{
  DateTime, FixedOffset, NaiveDate, NaiveTime, Offset as _, Timelike as _, Utc,
};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  geo::{Geofence, Position},
  record::CheckInStatus,
};

// ─── ClockTime ───────────────────────────────────────────────────────────────

/// A wall-clock time with minute precision, written `HH:MM`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
  hour:   u32,
  minute: u32,
}

impl ClockTime {
  pub fn new(hour: u32, minute: u32) -> Result<Self> {
    if hour < 24 && minute < 60 {
      Ok(Self { hour, minute })
    } else {
      Err(Error::InvalidClockTime(format!("{hour:02}:{minute:02}")))
    }
  }

  pub fn hour(self) -> u32 { self.hour }

  pub fn minute(self) -> u32 { self.minute }

  /// Truncate a time of day to the minute.
  pub fn of(time: NaiveTime) -> Self {
    Self { hour: time.hour(), minute: time.minute() }
  }
}

impl fmt::Display for ClockTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour, self.minute)
  }
}

impl FromStr for ClockTime {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let bad = || Error::InvalidClockTime(s.to_owned());
    let (h, m) = s.trim().split_once(':').ok_or_else(bad)?;
    let hour = h.parse().map_err(|_| bad())?;
    let minute = m.parse().map_err(|_| bad())?;
    Self::new(hour, minute).map_err(|_| bad())
  }
}

impl TryFrom<String> for ClockTime {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<ClockTime> for String {
  fn from(t: ClockTime) -> Self { t.to_string() }
}

// ─── AttendancePolicy ────────────────────────────────────────────────────────

/// Defaults: the Lima site office, 50 m radius, on time through 09:05.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendancePolicy {
  pub office:             Position,
  pub radius_m:           f64,
  /// Last minute that still counts as on time (inclusive through :59 s).
  pub on_time_until:      ClockTime,
  /// Offset of the site's civil clock from UTC. Lima has no DST.
  pub utc_offset_minutes: i32,
}

impl Default for AttendancePolicy {
  fn default() -> Self {
    Self {
      office:             Position::new(-12.114859, -77.026540),
      radius_m:           50.0,
      on_time_until:      ClockTime { hour: 9, minute: 5 },
      utc_offset_minutes: -300,
    }
  }
}

impl AttendancePolicy {
  pub fn geofence(&self) -> Geofence {
    Geofence { center: self.office, radius_m: self.radius_m }
  }

  pub fn offset(&self) -> Result<FixedOffset> {
    FixedOffset::east_opt(self.utc_offset_minutes * 60)
      .ok_or(Error::InvalidUtcOffset(self.utc_offset_minutes))
  }

  /// Reject configurations that cannot be applied.
  pub fn validate(&self) -> Result<()> {
    self.offset()?;
    if !(self.radius_m.is_finite() && self.radius_m >= 0.0) {
      return Err(Error::InvalidPolicy(format!(
        "radius must be a non-negative number of metres, got {}",
        self.radius_m
      )));
    }
    Ok(())
  }

  /// `instant` on the site's civil clock.
  pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    // An out-of-range offset is caught by `validate`; fall back to UTC.
    let offset = self.offset().unwrap_or_else(|_| Utc.fix());
    instant.with_timezone(&offset)
  }

  /// The civil day `instant` belongs to at the site.
  pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
    self.local(instant).date_naive()
  }

  pub fn classify(&self, instant: DateTime<Utc>) -> CheckInStatus {
    let at = ClockTime::of(self.local(instant).time());
    if at <= self.on_time_until {
      CheckInStatus::OnTime
    } else {
      CheckInStatus::Late
    }
  }

  /// Attach a local wall-clock time to `date`, as a UTC instant.
  pub fn at_local(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let offset = self.offset().unwrap_or_else(|_| Utc.fix());
    date
      .and_time(time)
      .and_local_timezone(offset)
      .single()
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|| date.and_time(time).and_utc())
  }
}
