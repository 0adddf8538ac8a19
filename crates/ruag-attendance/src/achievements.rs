//! Achievement rules, evaluated right after a check-in is created.
//!
//! Each rule is a stateless predicate over the new record plus whatever
//! history it asks the store for. Unlocks are write-once: the store rejects a
//! second unlock of the same achievement for the same person, and that
//! rejection just means "already held". Evaluation is best effort. A failing
//! rule is logged and skipped, it never undoes the check-in.

use chrono::{DateTime, Datelike as _, FixedOffset, Timelike as _, Utc, Weekday};
use ruag_core::{
  achievement::{AchievementId, AchievementUnlock},
  person::PersonId,
  policy::AttendancePolicy,
  record::{AttendanceRecord, CheckInStatus},
  store::{AttendanceStore, CreateError},
};

/// Pioneer: at most this many check-ins on the day, counting this one.
pub const PIONEER_LIMIT: u64 = 10;

/// EarlyBird: local check-in at or before this hour (08:30).
pub const EARLY_BIRD_HOURS: f64 = 8.5;

/// SwissClock: this many most recent records, all on time.
pub const SWISS_CLOCK_STREAK: usize = 5;

/// What the rules look at.
pub struct CheckInFacts<'a> {
  pub record: &'a AttendanceRecord,
  /// The check-in instant on the site's clock.
  pub local:  DateTime<FixedOffset>,
}

#[derive(Debug, Clone)]
pub struct AchievementEngine {
  policy: AttendancePolicy,
  rules:  Vec<AchievementId>,
}

impl AchievementEngine {
  pub fn new(policy: AttendancePolicy) -> Self {
    Self { policy, rules: AchievementId::ALL.to_vec() }
  }

  /// Restrict evaluation to `rules`.
  pub fn with_rules(mut self, rules: impl IntoIterator<Item = AchievementId>) -> Self {
    self.rules = rules.into_iter().collect();
    self
  }

  pub fn facts<'a>(&self, record: &'a AttendanceRecord) -> CheckInFacts<'a> {
    CheckInFacts { record, local: self.policy.local(record.check_in_time) }
  }

  /// Whether `rule` is satisfied by this check-in.
  pub async fn qualifies<S: AttendanceStore>(
    &self,
    rule: AchievementId,
    facts: &CheckInFacts<'_>,
    store: &S,
  ) -> Result<bool, S::Error> {
    let record = facts.record;
    match rule {
      AchievementId::Pioneer => {
        let count = store.count_day(record.calendar_date).await?;
        Ok(count <= PIONEER_LIMIT)
      }
      AchievementId::EarlyBird => {
        let hours =
          facts.local.hour() as f64 + facts.local.minute() as f64 / 60.0;
        Ok(hours <= EARLY_BIRD_HOURS)
      }
      AchievementId::WeekendHero => Ok(matches!(
        record.calendar_date.weekday(),
        Weekday::Sat | Weekday::Sun
      )),
      AchievementId::SwissClock => {
        let recent = store
          .recent_for_person(record.person_id.clone(), SWISS_CLOCK_STREAK)
          .await?;
        Ok(
          recent.len() == SWISS_CLOCK_STREAK
            && recent.iter().all(|r| r.check_in_status == CheckInStatus::OnTime),
        )
      }
    }
  }

  /// Record an unlock. `Ok(None)` means the person already held it.
  pub async fn unlock<S: AttendanceStore>(
    &self,
    store: &S,
    person_id: PersonId,
    rule: AchievementId,
    at: DateTime<Utc>,
  ) -> Result<Option<AchievementUnlock>, S::Error> {
    match store.record_unlock(person_id, rule, at).await {
      Ok(unlock) => Ok(Some(unlock)),
      Err(CreateError::Conflict) => Ok(None),
      Err(CreateError::Backend(e)) => Err(e),
    }
  }

  /// Run every rule against a freshly created record and return the unlocks
  /// that are new as of this evaluation.
  pub async fn evaluate<S: AttendanceStore>(
    &self,
    store: &S,
    record: &AttendanceRecord,
    now: DateTime<Utc>,
  ) -> Vec<AchievementUnlock> {
    let facts = self.facts(record);
    let mut unlocked = Vec::new();

    for &rule in &self.rules {
      let outcome = match self.qualifies(rule, &facts, store).await {
        Ok(true) => self.unlock(store, record.person_id.clone(), rule, now).await,
        Ok(false) => Ok(None),
        Err(e) => Err(e),
      };

      match outcome {
        Ok(Some(unlock)) => {
          tracing::info!(
            person_id = %record.person_id,
            achievement = %rule,
            "achievement unlocked"
          );
          unlocked.push(unlock);
        }
        Ok(None) => {}
        Err(e) => {
          tracing::warn!(
            person_id = %record.person_id,
            achievement = %rule,
            error = %e,
            "achievement evaluation failed"
          );
        }
      }
    }

    unlocked
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, NaiveTime};

  use super::*;
  use crate::testutil::{Fixture, FailingStore, person};

  fn engine() -> AchievementEngine { AchievementEngine::new(AttendancePolicy::default()) }

  #[tokio::test]
  async fn early_bird_boundary() {
    let fx = Fixture::new().await;
    let e = engine().with_rules([AchievementId::EarlyBird]);
    let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let at_830 = fx.insert(&person(1), monday, (8, 30), CheckInStatus::OnTime).await;
    let facts = e.facts(&at_830);
    assert!(e.qualifies(AchievementId::EarlyBird, &facts, &fx.store).await.unwrap());

    let at_831 = fx.insert(&person(2), monday, (8, 31), CheckInStatus::OnTime).await;
    let facts = e.facts(&at_831);
    assert!(!e.qualifies(AchievementId::EarlyBird, &facts, &fx.store).await.unwrap());
  }

  #[tokio::test]
  async fn weekend_hero_on_saturday_and_sunday_only() {
    let fx = Fixture::new().await;
    let e = engine();
    for (d, expected) in [(8, true), (9, true), (10, false), (14, false)] {
      let date = NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
      let r = fx.insert(&person(d), date, (10, 0), CheckInStatus::Late).await;
      let facts = e.facts(&r);
      assert_eq!(
        e.qualifies(AchievementId::WeekendHero, &facts, &fx.store).await.unwrap(),
        expected,
        "{date}"
      );
    }
  }

  #[tokio::test]
  async fn pioneer_is_the_first_ten() {
    let fx = Fixture::new().await;
    let e = engine();
    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let mut records = Vec::new();
    for n in 1..=11 {
      records.push(fx.insert(&person(n), day, (7, 0), CheckInStatus::OnTime).await);
    }
    // Evaluated once eleven rows exist, nobody qualifies any more.
    let facts = e.facts(&records[10]);
    assert!(!e.qualifies(AchievementId::Pioneer, &facts, &fx.store).await.unwrap());

    let other_day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    let tenth = fx.insert(&person(1), other_day, (7, 0), CheckInStatus::OnTime).await;
    for n in 2..=10 {
      fx.insert(&person(n), other_day, (7, 5), CheckInStatus::OnTime).await;
    }
    let facts = e.facts(&tenth);
    assert_eq!(fx.store.count_day(other_day).await.unwrap(), 10);
    assert!(e.qualifies(AchievementId::Pioneer, &facts, &fx.store).await.unwrap());
  }

  #[tokio::test]
  async fn swiss_clock_needs_five_on_time_records() {
    let fx = Fixture::new().await;
    let e = engine();
    let p = person(1);

    let mut last = None;
    for d in 3..=6 {
      let date = NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
      last = Some(fx.insert(&p, date, (8, 0), CheckInStatus::OnTime).await);
    }
    let facts = e.facts(last.as_ref().unwrap());
    assert!(
      !e.qualifies(AchievementId::SwissClock, &facts, &fx.store).await.unwrap(),
      "four records are not enough"
    );

    let fifth = fx
      .insert(&p, NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(), (8, 0), CheckInStatus::OnTime)
      .await;
    let facts = e.facts(&fifth);
    assert!(e.qualifies(AchievementId::SwissClock, &facts, &fx.store).await.unwrap());

    let late = fx
      .insert(&p, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), (9, 30), CheckInStatus::Late)
      .await;
    let facts = e.facts(&late);
    assert!(!e.qualifies(AchievementId::SwissClock, &facts, &fx.store).await.unwrap());
  }

  #[tokio::test]
  async fn unlocking_twice_is_silent() {
    let fx = Fixture::new().await;
    let e = engine().with_rules([AchievementId::SwissClock]);
    let p = person(1);

    let mut last = None;
    for d in 3..=7 {
      let date = NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
      last = Some(fx.insert(&p, date, (8, 0), CheckInStatus::OnTime).await);
    }
    let record = last.unwrap();
    let now = Utc::now();

    let first = e.evaluate(&fx.store, &record, now).await;
    assert_eq!(first.len(), 1);
    let second = e.evaluate(&fx.store, &record, now).await;
    assert!(second.is_empty());

    let held = fx.store.list_unlocks(p).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].achievement_id, AchievementId::SwissClock);
  }

  #[tokio::test]
  async fn failing_store_yields_no_unlocks_and_no_error() {
    let e = engine();
    let fx = Fixture::new().await;
    let date = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
    let record = fx.insert(&person(1), date, (8, 0), CheckInStatus::OnTime).await;

    let unlocked = e.evaluate(&FailingStore, &record, Utc::now()).await;
    assert!(unlocked.is_empty());
  }

  #[test]
  fn facts_use_site_clock() {
    let e = engine();
    let policy = AttendancePolicy::default();
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let record = AttendanceRecord {
      id:              uuid::Uuid::new_v4(),
      person_id:       person(1),
      full_name:       "x".into(),
      area:            "y".into(),
      photo_ref:       None,
      calendar_date:   date,
      check_in_time:   policy.at_local(date, NaiveTime::from_hms_opt(8, 15, 0).unwrap()),
      check_in_status: CheckInStatus::OnTime,
      check_out_time:  None,
      note:            None,
    };
    let facts = e.facts(&record);
    assert_eq!((facts.local.hour(), facts.local.minute()), (8, 15));
  }
}
