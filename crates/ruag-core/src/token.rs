//! The rotating kiosk token.
//!
//! The kiosk displays `"<PREFIX>_<window>"` where `window` is the number of
//! whole 10-second buckets since the Unix epoch. A scanned token is accepted
//! while its window is at most one bucket away from the validator's clock,
//! which gives a 10 to 20 second acceptance span: short enough to defeat
//! sharing a screenshot, long enough to absorb skew between kiosk and phone.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Default literal shared by the kiosk and the scanner.
pub const DEFAULT_PREFIX: &str = "RUAG_INGRESO";

/// Length of one rotation window, in seconds.
pub const WINDOW_SECS: i64 = 10;

/// How many windows either side of "now" are still accepted.
pub const WINDOW_TOLERANCE: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
  #[error("token not recognised")]
  Malformed,
  #[error("token has expired")]
  Expired,
}

/// The rotation window containing `instant`.
pub fn window_of(instant: DateTime<Utc>) -> i64 {
  instant.timestamp().div_euclid(WINDOW_SECS)
}

/// Encodes and validates tokens for one agreed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCodec {
  prefix: String,
  fields: usize,
}

impl Default for TokenCodec {
  fn default() -> Self { Self::new(DEFAULT_PREFIX) }
}

impl TokenCodec {
  pub fn new(prefix: impl Into<String>) -> Self {
    let prefix = prefix.into();
    // The window is one more `_`-separated field after the prefix's own.
    let fields = prefix.split('_').count() + 1;
    Self { prefix, fields }
  }

  pub fn prefix(&self) -> &str { &self.prefix }

  pub fn encode(&self, instant: DateTime<Utc>) -> String {
    self.encode_window(window_of(instant))
  }

  pub fn encode_window(&self, window: i64) -> String {
    format!("{}_{window}", self.prefix)
  }

  /// Extract the window from a token without checking its age.
  pub fn parse(&self, token: &str) -> Result<i64, TokenError> {
    let rest = token
      .strip_prefix(self.prefix.as_str())
      .and_then(|r| r.strip_prefix('_'))
      .ok_or(TokenError::Malformed)?;

    if token.split('_').count() != self.fields {
      return Err(TokenError::Malformed);
    }

    rest.parse::<i64>().map_err(|_| TokenError::Malformed)
  }

  pub fn validate(
    &self,
    token: &str,
    now: DateTime<Utc>,
  ) -> Result<(), TokenError> {
    let token_window = self.parse(token)?;
    let current = window_of(now);
    if current.abs_diff(token_window) > WINDOW_TOLERANCE as u64 {
      return Err(TokenError::Expired);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn encode_uses_ten_second_windows() {
    let codec = TokenCodec::default();
    assert_eq!(codec.encode(at(1_000_009)), "RUAG_INGRESO_100000");
    assert_eq!(codec.encode(at(1_000_010)), "RUAG_INGRESO_100001");
  }

  #[test]
  fn window_floors_before_the_epoch() {
    assert_eq!(window_of(at(-1)), -1);
    assert_eq!(window_of(at(-10)), -1);
    assert_eq!(window_of(at(-11)), -2);
  }

  #[test]
  fn adjacent_window_is_accepted_and_two_away_is_expired() {
    let codec = TokenCodec::default();
    let token = codec.encode_window(100_000);

    assert_eq!(codec.validate(&token, at(1_000_000)), Ok(()));
    assert_eq!(codec.validate(&token, at(1_000_010)), Ok(()));
    assert_eq!(codec.validate(&token, at(999_990)), Ok(()));
    assert_eq!(codec.validate(&token, at(1_000_020)), Err(TokenError::Expired));
    assert_eq!(codec.validate(&token, at(999_980)), Err(TokenError::Expired));
  }

  #[test]
  fn acceptance_matches_window_distance_everywhere() {
    let codec = TokenCodec::default();
    for generated in (1_000_000..1_000_060).step_by(3) {
      let token = codec.encode(at(generated));
      for validated in (999_950..1_000_110).step_by(7) {
        let expected =
          window_of(at(generated)).abs_diff(window_of(at(validated))) <= 1;
        assert_eq!(
          codec.validate(&token, at(validated)).is_ok(),
          expected,
          "generated {generated}, validated {validated}",
        );
      }
    }
  }

  #[test]
  fn wrong_prefix_is_malformed() {
    let codec = TokenCodec::default();
    let now = at(1_000_000);
    for bad in ["", "RUAG_SALIDA_100000", "ruag_ingreso_100000", "RUAG_INGRESO"]
    {
      assert_eq!(codec.validate(bad, now), Err(TokenError::Malformed), "{bad:?}");
    }
  }

  #[test]
  fn wrong_field_count_is_malformed() {
    let codec = TokenCodec::default();
    let now = at(1_000_000);
    assert_eq!(
      codec.validate("RUAG_INGRESO_100000_1", now),
      Err(TokenError::Malformed)
    );
    assert_eq!(
      codec.validate("RUAG_INGRESO__100000", now),
      Err(TokenError::Malformed)
    );
  }

  #[test]
  fn non_numeric_window_is_malformed() {
    let codec = TokenCodec::default();
    let now = at(1_000_000);
    assert_eq!(codec.validate("RUAG_INGRESO_abc", now), Err(TokenError::Malformed));
    assert_eq!(codec.validate("RUAG_INGRESO_", now), Err(TokenError::Malformed));
  }

  #[test]
  fn custom_prefix_changes_field_count() {
    let codec = TokenCodec::new("KIOSK");
    assert_eq!(codec.parse("KIOSK_42"), Ok(42));
    assert_eq!(codec.parse("KIOSK_A_42"), Err(TokenError::Malformed));
  }
}
