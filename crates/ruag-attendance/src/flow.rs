//! The per-person, per-day attendance state machine.
//!
//! `NotCheckedIn → CheckedIn → CheckedOut`. Creation races between devices
//! are settled by the store's uniqueness constraint: the loser reads the
//! winner's row back and reports success.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use ruag_core::{
  achievement::AchievementUnlock,
  geo::Geofence,
  note::{self, RemoteNote},
  person::{PersonId, Profile},
  policy::AttendancePolicy,
  record::{AttendanceRecord, DayState, DaySummary, NewAttendanceRecord},
  store::{AttendanceStore, CreateError},
  token::TokenCodec,
};

use crate::{
  Error, Result,
  achievements::AchievementEngine,
  events::{AttendanceEvent, EventFeed},
  location::{LocationProvider, locate},
};

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Clone)]
pub struct FlowConfig {
  pub policy:           AttendancePolicy,
  pub codec:            TokenCodec,
  pub location_timeout: Duration,
}

impl Default for FlowConfig {
  fn default() -> Self {
    Self {
      policy:           AttendancePolicy::default(),
      codec:            TokenCodec::default(),
      location_timeout: DEFAULT_LOCATION_TIMEOUT,
    }
  }
}

/// Result of a check-in attempt that was accepted.
#[derive(Debug, Clone)]
pub struct CheckIn {
  pub record:   AttendanceRecord,
  /// `false` when another device created today's record first.
  pub created:  bool,
  /// Achievements newly unlocked by this check-in.
  pub unlocked: Vec<AchievementUnlock>,
}

pub struct AttendanceFlow<S> {
  store:            Arc<S>,
  codec:            TokenCodec,
  policy:           AttendancePolicy,
  fence:            Geofence,
  location_timeout: Duration,
  engine:           AchievementEngine,
  events:           EventFeed,
}

impl<S> Clone for AttendanceFlow<S> {
  fn clone(&self) -> Self {
    Self {
      store:            Arc::clone(&self.store),
      codec:            self.codec.clone(),
      policy:           self.policy.clone(),
      fence:            self.fence,
      location_timeout: self.location_timeout,
      engine:           self.engine.clone(),
      events:           self.events.clone(),
    }
  }
}

impl<S: AttendanceStore> AttendanceFlow<S> {
  pub fn new(store: Arc<S>, config: FlowConfig) -> ruag_core::Result<Self> {
    config.policy.validate()?;
    Ok(Self {
      store,
      fence: config.policy.geofence(),
      engine: AchievementEngine::new(config.policy.clone()),
      codec: config.codec,
      policy: config.policy,
      location_timeout: config.location_timeout,
      events: EventFeed::default(),
    })
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn events(&self) -> &EventFeed { &self.events }

  pub fn codec(&self) -> &TokenCodec { &self.codec }

  pub fn policy(&self) -> &AttendancePolicy { &self.policy }

  /// Validate a scanned token and the device position, then record today's
  /// arrival for `profile`.
  pub async fn check_in<L: LocationProvider>(
    &self,
    profile: &Profile,
    token: &str,
    locator: &L,
    now: DateTime<Utc>,
  ) -> Result<CheckIn> {
    let person_id = &profile.person_id;

    self.codec.validate(token, now).map_err(|e| {
      tracing::warn!(%person_id, error = %e, "check-in token rejected");
      Error::from(e)
    })?;

    let position = locate(locator, self.location_timeout).await.map_err(|e| {
      tracing::warn!(%person_id, error = %e, "check-in without location");
      Error::from(e)
    })?;

    self.fence.check(position).map_err(|e| {
      tracing::warn!(%person_id, distance_m = e.distance_m, "check-in outside geofence");
      Error::from(e)
    })?;

    let status = self.policy.classify(now);
    let date = self.policy.local_date(now);
    let input = NewAttendanceRecord::from_profile(profile, date, now, status);

    let (record, created) = match self.store.create_record(input).await {
      Ok(record) => (record, true),
      Err(CreateError::Conflict) => {
        tracing::debug!(%person_id, %date, "check-in lost creation race; reading back");
        let existing = self
          .store
          .find_record(person_id.clone(), date)
          .await
          .map_err(Error::persistence)?
          .ok_or_else(|| {
            Error::persistence(VanishedRecord { person_id: person_id.clone(), date })
          })?;
        (existing, false)
      }
      Err(CreateError::Backend(e)) => return Err(Error::persistence(e)),
    };

    let unlocked = if created {
      tracing::info!(
        %person_id,
        status = %record.check_in_status,
        record_id = %record.id,
        "checked in"
      );
      self.events.publish(AttendanceEvent::CheckedIn { record: record.clone() });
      let unlocked = self.engine.evaluate(self.store.as_ref(), &record, now).await;
      for unlock in &unlocked {
        self
          .events
          .publish(AttendanceEvent::AchievementUnlocked { unlock: unlock.clone() });
      }
      unlocked
    } else {
      Vec::new()
    };

    Ok(CheckIn { record, created, unlocked })
  }

  /// Record the departure on `record`.
  ///
  /// Outside the geofence a non-blank `note` is required and the stored note
  /// carries the position. A record that is already checked out is returned
  /// unchanged.
  pub async fn check_out<L: LocationProvider>(
    &self,
    record: AttendanceRecord,
    locator: &L,
    now: DateTime<Utc>,
    note: Option<&str>,
  ) -> Result<AttendanceRecord> {
    if record.is_checked_out() {
      return Ok(record);
    }
    let person_id = &record.person_id;

    let position = locate(locator, self.location_timeout).await.map_err(|e| {
      tracing::warn!(%person_id, error = %e, "check-out without location");
      Error::from(e)
    })?;

    let text = note.map(str::trim).filter(|t| !t.is_empty());
    if text.is_some_and(note::has_marker) {
      tracing::warn!(%person_id, "check-out note carries the remote marker");
      return Err(Error::NoteInvalid);
    }
    let (stored_note, remote) = match self.fence.check(position) {
      Ok(()) => (text.map(str::to_owned), false),
      Err(out) => {
        let Some(text) = text else {
          tracing::warn!(%person_id, distance_m = out.distance_m, "remote check-out without note");
          return Err(Error::NoteRequired);
        };
        (Some(RemoteNote::new(text, position).encode()), true)
      }
    };

    let write = self
      .store
      .set_check_out(record.id, now, stored_note)
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::RecordNotFound(record.id))?;
    let updated = write.record;

    if !write.applied {
      tracing::debug!(%person_id, record_id = %updated.id, "already checked out");
      return Ok(updated);
    }

    tracing::info!(%person_id, remote, record_id = %updated.id, "checked out");
    self.events.publish(AttendanceEvent::CheckedOut { record: updated.clone(), remote });
    Ok(updated)
  }

  /// Check out today's record for `person_id`.
  pub async fn check_out_today<L: LocationProvider>(
    &self,
    person_id: &PersonId,
    locator: &L,
    now: DateTime<Utc>,
    note: Option<&str>,
  ) -> Result<AttendanceRecord> {
    match self.day_state(person_id, now).await? {
      DayState::NotCheckedIn => Err(Error::NotCheckedIn),
      DayState::CheckedIn(record) | DayState::CheckedOut(record) => {
        self.check_out(record, locator, now, note).await
      }
    }
  }

  /// Where `person_id` stands today.
  pub async fn day_state(&self, person_id: &PersonId, now: DateTime<Utc>) -> Result<DayState> {
    let record = self
      .store
      .find_record(person_id.clone(), self.policy.local_date(now))
      .await
      .map_err(Error::persistence)?;
    Ok(DayState::from_record(record))
  }

  /// The site-local day `now` falls on.
  pub fn today(&self, now: DateTime<Utc>) -> NaiveDate { self.policy.local_date(now) }

  pub async fn roster(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
    self.store.list_day(date).await.map_err(Error::persistence)
  }

  pub async fn summary(&self, date: NaiveDate) -> Result<DaySummary> {
    let roster = self.roster(date).await?;
    Ok(DaySummary::from_roster(date, &roster))
  }

  pub async fn unlocks(&self, person_id: &PersonId) -> Result<Vec<AchievementUnlock>> {
    self
      .store
      .list_unlocks(person_id.clone())
      .await
      .map_err(Error::persistence)
  }
}

/// A create conflicted but the conflicting row could not be read back.
#[derive(Debug, thiserror::Error)]
#[error("record for {person_id} on {date} conflicted but could not be read")]
struct VanishedRecord {
  person_id: PersonId,
  date:      NaiveDate,
}
