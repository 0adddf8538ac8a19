//! People who check in, and the profile snapshot copied onto each record.
//!
//! Profiles are owned by the registration flow; the attendance core only ever
//! reads them and copies their fields onto the day's record.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── PersonId ────────────────────────────────────────────────────────────────

/// Stable external identifier of a person: an 8-digit national ID.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PersonId(String);

impl PersonId {
  pub const LEN: usize = 8;

  pub fn parse(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    if trimmed.len() == Self::LEN && trimmed.bytes().all(|b| b.is_ascii_digit())
    {
      Ok(Self(trimmed.to_owned()))
    } else {
      Err(Error::InvalidPersonId(s.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PersonId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for PersonId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for PersonId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<PersonId> for String {
  fn from(id: PersonId) -> Self { id.0 }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The registration card of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub person_id: PersonId,
  pub full_name: String,
  /// Free-form department or work area, e.g. "Logística".
  pub area:      String,
  /// Opaque reference into the external photo store.
  pub photo_ref: Option<String>,
}

impl Profile {
  /// Build a profile, rejecting blank names and areas.
  pub fn new(
    person_id: PersonId,
    full_name: impl Into<String>,
    area: impl Into<String>,
    photo_ref: Option<String>,
  ) -> Result<Self> {
    let full_name = full_name.into().trim().to_owned();
    let area = area.into().trim().to_owned();
    if full_name.is_empty() {
      return Err(Error::InvalidProfile("full name is blank".into()));
    }
    if area.is_empty() {
      return Err(Error::InvalidProfile("area is blank".into()));
    }
    Ok(Self { person_id, full_name, area, photo_ref })
  }
}
