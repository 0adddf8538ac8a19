//! Shared fixtures for this crate's tests.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ruag_core::{
  achievement::{AchievementId, AchievementUnlock},
  geo::Position,
  person::{PersonId, Profile},
  policy::AttendancePolicy,
  record::{AttendanceRecord, CheckInStatus, NewAttendanceRecord},
  store::{AttendanceStore, CheckOutWrite, CreateError},
};
use ruag_store_sqlite::SqliteStore;
use thiserror::Error;
use uuid::Uuid;

pub fn person(n: u32) -> PersonId { PersonId::parse(&format!("{n:08}")).unwrap() }

pub fn profile(n: u32) -> Profile {
  Profile::new(person(n), format!("Persona {n}"), "Operaciones/Proyectos", None)
    .unwrap()
}

pub fn policy() -> AttendancePolicy { AttendancePolicy::default() }

/// A site-local wall-clock time on `date`, as UTC.
pub fn local(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
  policy().at_local(date, NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

/// A point roughly `metres` north of the office.
pub fn north_of_office(metres: f64) -> Position {
  let office = policy().office;
  Position::new(office.latitude + metres / 111_194.93, office.longitude)
}

pub struct Fixture {
  pub store: SqliteStore,
}

impl Fixture {
  pub async fn new() -> Self {
    Self { store: SqliteStore::open_in_memory().await.expect("in-memory store") }
  }

  /// Insert a record directly, bypassing the flow.
  pub async fn insert(
    &self,
    p: &PersonId,
    date: NaiveDate,
    (h, m): (u32, u32),
    status: CheckInStatus,
  ) -> AttendanceRecord {
    self
      .store
      .create_record(NewAttendanceRecord {
        person_id:       p.clone(),
        full_name:       "Persona".into(),
        area:            "Rrhh".into(),
        photo_ref:       None,
        calendar_date:   date,
        check_in_time:   local(date, h, m),
        check_in_status: status,
      })
      .await
      .expect("insert record")
  }
}

#[derive(Debug, Error)]
#[error("store offline")]
pub struct Offline;

/// A store whose every call fails.
pub struct FailingStore;

impl AttendanceStore for FailingStore {
  type Error = Offline;

  async fn create_record(
    &self,
    _input: NewAttendanceRecord,
  ) -> Result<AttendanceRecord, CreateError<Offline>> {
    Err(CreateError::Backend(Offline))
  }

  async fn find_record(
    &self,
    _person_id: PersonId,
    _date: NaiveDate,
  ) -> Result<Option<AttendanceRecord>, Offline> {
    Err(Offline)
  }

  async fn set_check_out(
    &self,
    _id: Uuid,
    _check_out_time: DateTime<Utc>,
    _note: Option<String>,
  ) -> Result<Option<CheckOutWrite>, Offline> {
    Err(Offline)
  }

  async fn list_day(&self, _date: NaiveDate) -> Result<Vec<AttendanceRecord>, Offline> {
    Err(Offline)
  }

  async fn count_day(&self, _date: NaiveDate) -> Result<u64, Offline> { Err(Offline) }

  async fn recent_for_person(
    &self,
    _person_id: PersonId,
    _limit: usize,
  ) -> Result<Vec<AttendanceRecord>, Offline> {
    Err(Offline)
  }

  async fn record_unlock(
    &self,
    _person_id: PersonId,
    _achievement_id: AchievementId,
    _unlocked_at: DateTime<Utc>,
  ) -> Result<AchievementUnlock, CreateError<Offline>> {
    Err(CreateError::Backend(Offline))
  }

  async fn list_unlocks(
    &self,
    _person_id: PersonId,
  ) -> Result<Vec<AchievementUnlock>, Offline> {
    Err(Offline)
  }
}
