//! Justification notes for departures recorded outside the geofence.
//!
//! The stored note keeps the person's free text and appends the raw position
//! as a trailing `[REMOTO:<lat>,<lon>]` marker, so reports can later tell a
//! remote exit apart from an ordinary note and see where it happened.

use crate::geo::Position;

const MARKER_TAG: &str = "[REMOTO:";
const MARKER_OPEN: &str = " [REMOTO:";
const MARKER_CLOSE: char = ']';

/// Whether free text carries the remote marker. Such text would decode as a
/// remote exit, so it is never accepted as a note.
pub fn has_marker(text: &str) -> bool { text.contains(MARKER_TAG) }

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteNote {
  pub text:     String,
  pub position: Position,
}

impl RemoteNote {
  pub fn new(text: impl Into<String>, position: Position) -> Self {
    Self { text: text.into(), position }
  }

  pub fn encode(&self) -> String {
    format!(
      "{}{MARKER_OPEN}{},{}{MARKER_CLOSE}",
      self.text, self.position.latitude, self.position.longitude
    )
  }

  /// Recover text and position from a stored note. Plain notes yield `None`.
  pub fn parse(note: &str) -> Option<Self> {
    let body = note.strip_suffix(MARKER_CLOSE)?;
    let start = body.rfind(MARKER_OPEN)?;
    let (lat, lon) = body[start + MARKER_OPEN.len()..].split_once(',')?;
    let position = Position::new(lat.parse().ok()?, lon.parse().ok()?);
    Some(Self { text: body[..start].to_owned(), position })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encoded_note_recovers_text_and_position() {
    let note = RemoteNote::new("Reunión con cliente", Position::new(-12.046374, -77.042793));
    let stored = note.encode();
    assert_eq!(stored, "Reunión con cliente [REMOTO:-12.046374,-77.042793]");
    assert_eq!(RemoteNote::parse(&stored), Some(note));
  }

  #[test]
  fn coordinates_are_stored_exactly() {
    for (lat, lon) in [(-12.114859123456789, -77.02654000000001), (0.1 + 0.2, -1e-9), (90.0, -180.0)] {
      let note = RemoteNote::new("x", Position::new(lat, lon));
      let parsed = RemoteNote::parse(&note.encode()).unwrap();
      assert_eq!(parsed.position, note.position);
    }
  }

  #[test]
  fn marker_is_detected_in_free_text() {
    assert!(has_marker("bye [REMOTO:0.0,0.0]"));
    assert!(has_marker("[REMOTO:"));
    assert!(!has_marker("remoto, visita [obra]"));
  }

  #[test]
  fn plain_notes_are_not_remote() {
    assert_eq!(RemoteNote::parse("left early, dentist"), None);
    assert_eq!(RemoteNote::parse("[REMOTO:abc,def]"), None);
    assert_eq!(RemoteNote::parse(" [REMOTO:1.0]"), None);
  }

  #[test]
  fn brackets_inside_text_survive() {
    let note = RemoteNote::new("obra [b] norte", Position::new(1.5, -2.25));
    let parsed = RemoteNote::parse(&note.encode()).unwrap();
    assert_eq!(parsed.text, "obra [b] norte");
    assert_eq!(parsed.position, Position::new(1.5, -2.25));
  }
}
