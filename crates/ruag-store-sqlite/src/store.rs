//! [`SqliteStore`], the SQLite implementation of [`AttendanceStore`] and
//! [`ProfileStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use ruag_core::{
  achievement::{AchievementId, AchievementUnlock},
  person::{PersonId, Profile},
  record::{AttendanceRecord, NewAttendanceRecord},
  store::{AttendanceStore, CheckOutWrite, CreateError, ProfileStore},
};

use crate::{
  Error, Result,
  encode::{
    RECORD_COLUMNS, RawProfile, RawRecord, RawUnlock, encode_date, encode_dt,
    encode_uuid, stored_dt,
  },
  schema::SCHEMA,
};

/// Whether `e` is a UNIQUE or PRIMARY KEY violation.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  match e {
    rusqlite::Error::SqliteFailure(f, _) => {
      f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    }
    _ => false,
  }
}

/// Run an INSERT, mapping a uniqueness violation to `Ok(false)`.
fn insert_unique(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<bool> {
  match conn.execute(sql, params) {
    Ok(_) => Ok(true),
    Err(e) if is_unique_violation(&e) => Ok(false),
    Err(e) => Err(e),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendance store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_records(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<AttendanceRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = Error;

  // ── Records ───────────────────────────────────────────────────────────────

  async fn create_record(
    &self,
    input: NewAttendanceRecord,
  ) -> Result<AttendanceRecord, CreateError<Error>> {
    let record = AttendanceRecord {
      id:              Uuid::new_v4(),
      person_id:       input.person_id,
      full_name:       input.full_name,
      area:            input.area,
      photo_ref:       input.photo_ref,
      calendar_date:   input.calendar_date,
      check_in_time:   stored_dt(input.check_in_time),
      check_in_status: input.check_in_status,
      check_out_time:  None,
      note:            None,
    };

    let id_str     = encode_uuid(record.id);
    let person_str = record.person_id.to_string();
    let full_name  = record.full_name.clone();
    let area       = record.area.clone();
    let photo_ref  = record.photo_ref.clone();
    let date_str   = encode_date(record.calendar_date);
    let at_str     = encode_dt(record.check_in_time);
    let status_str = record.check_in_status.as_str();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO attendance_records (
             id, person_id, full_name, area, photo_ref,
             calendar_date, check_in_time, check_in_status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, person_str, full_name, area, photo_ref, date_str, at_str,
            status_str,
          ],
        )?)
      })
      .await
      .map_err(|e| CreateError::Backend(e.into()))?;

    if !inserted {
      tracing::debug!(
        person_id = %record.person_id,
        date = %record.calendar_date,
        "attendance record already exists"
      );
      return Err(CreateError::Conflict);
    }
    Ok(record)
  }

  async fn find_record(
    &self,
    person_id: PersonId,
    date:      NaiveDate,
  ) -> Result<Option<AttendanceRecord>> {
    let person_str = person_id.to_string();
    let date_str   = encode_date(date);

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RECORD_COLUMNS} FROM attendance_records
               WHERE person_id = ?1 AND calendar_date = ?2"
            ),
            rusqlite::params![person_str, date_str],
            RawRecord::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn set_check_out(
    &self,
    id:             Uuid,
    check_out_time: DateTime<Utc>,
    note:           Option<String>,
  ) -> Result<Option<CheckOutWrite>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(check_out_time);

    let (changed, raw): (usize, Option<RawRecord>) = self
      .conn
      .call(move |conn| {
        // The IS NULL guard keeps a checked-out record terminal even when two
        // departures race.
        let changed = conn.execute(
          "UPDATE attendance_records
             SET check_out_time = ?2, note = ?3
           WHERE id = ?1 AND check_out_time IS NULL",
          rusqlite::params![id_str, at_str, note],
        )?;
        let raw = conn
          .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = ?1"),
            rusqlite::params![id_str],
            RawRecord::from_row,
          )
          .optional()?;
        Ok((changed, raw))
      })
      .await?;

    raw
      .map(|raw| -> Result<CheckOutWrite> {
        Ok(CheckOutWrite { record: raw.into_record()?, applied: changed > 0 })
      })
      .transpose()
  }

  async fn list_day(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
    self
      .query_records(
        format!(
          "SELECT {RECORD_COLUMNS} FROM attendance_records
           WHERE calendar_date = ?1
           ORDER BY check_in_time DESC"
        ),
        vec![encode_date(date).into()],
      )
      .await
  }

  async fn count_day(&self, date: NaiveDate) -> Result<u64> {
    let date_str = encode_date(date);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM attendance_records WHERE calendar_date = ?1",
          rusqlite::params![date_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn recent_for_person(
    &self,
    person_id: PersonId,
    limit:     usize,
  ) -> Result<Vec<AttendanceRecord>> {
    self
      .query_records(
        format!(
          "SELECT {RECORD_COLUMNS} FROM attendance_records
           WHERE person_id = ?1
           ORDER BY calendar_date DESC
           LIMIT ?2"
        ),
        vec![person_id.to_string().into(), (limit as i64).into()],
      )
      .await
  }

  // ── Achievements ──────────────────────────────────────────────────────────

  async fn record_unlock(
    &self,
    person_id:      PersonId,
    achievement_id: AchievementId,
    unlocked_at:    DateTime<Utc>,
  ) -> Result<AchievementUnlock, CreateError<Error>> {
    let person_str = person_id.to_string();
    let ach_str    = achievement_id.as_str();
    let unlocked_at = stored_dt(unlocked_at);
    let at_str     = encode_dt(unlocked_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO achievement_unlocks (person_id, achievement_id, unlocked_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![person_str, ach_str, at_str],
        )?)
      })
      .await
      .map_err(|e| CreateError::Backend(e.into()))?;

    if !inserted {
      return Err(CreateError::Conflict);
    }
    Ok(AchievementUnlock { person_id, achievement_id, unlocked_at })
  }

  async fn list_unlocks(&self, person_id: PersonId) -> Result<Vec<AchievementUnlock>> {
    let person_str = person_id.to_string();

    let raws: Vec<RawUnlock> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT person_id, achievement_id, unlocked_at
           FROM achievement_unlocks
           WHERE person_id = ?1
           ORDER BY unlocked_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![person_str], |row| {
            Ok(RawUnlock {
              person_id:      row.get(0)?,
              achievement_id: row.get(1)?,
              unlocked_at:    row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUnlock::into_unlock).collect()
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn upsert_profile(&self, profile: Profile) -> Result<Profile> {
    let person_str = profile.person_id.to_string();
    let full_name  = profile.full_name.clone();
    let area       = profile.area.clone();
    let photo_ref  = profile.photo_ref.clone();
    let at_str     = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (person_id, full_name, area, photo_ref, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (person_id) DO UPDATE SET
             full_name  = excluded.full_name,
             area       = excluded.area,
             photo_ref  = excluded.photo_ref,
             updated_at = excluded.updated_at",
          rusqlite::params![person_str, full_name, area, photo_ref, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn get_profile(&self, person_id: PersonId) -> Result<Option<Profile>> {
    let person_str = person_id.to_string();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT person_id, full_name, area, photo_ref
             FROM profiles WHERE person_id = ?1",
            rusqlite::params![person_str],
            |row| {
              Ok(RawProfile {
                person_id: row.get(0)?,
                full_name: row.get(1)?,
                area:      row.get(2)?,
                photo_ref: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }
}
