//! Achievements: write-once badges unlocked by check-in behaviour.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, person::PersonId};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
  /// Among the first ten people to check in on a day.
  Pioneer,
  /// Checked in at or before 08:30.
  EarlyBird,
  /// Checked in on a Saturday or Sunday.
  WeekendHero,
  /// Five most recent check-ins all on time.
  SwissClock,
}

impl AchievementId {
  pub const ALL: [Self; 4] =
    [Self::Pioneer, Self::EarlyBird, Self::WeekendHero, Self::SwissClock];

  /// The discriminant stored in the `achievement_id` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pioneer => "pioneer",
      Self::EarlyBird => "early_bird",
      Self::WeekendHero => "weekend_hero",
      Self::SwissClock => "swiss_clock",
    }
  }
}

impl fmt::Display for AchievementId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AchievementId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|a| a.as_str() == s)
      .ok_or_else(|| Error::UnknownAchievement(s.to_owned()))
  }
}

/// At most one per (person, achievement); never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementUnlock {
  pub person_id:      PersonId,
  pub achievement_id: AchievementId,
  pub unlocked_at:    DateTime<Utc>,
}
