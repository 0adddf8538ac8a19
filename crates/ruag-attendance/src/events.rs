//! The live attendance feed.
//!
//! Every persisted change is published here for dashboards and notifiers.
//! Publishing is fire-and-forget: having no subscribers, or a lagging one,
//! never affects the operation that produced the event.

use ruag_core::{achievement::AchievementUnlock, record::AttendanceRecord};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AttendanceEvent {
  CheckedIn { record: AttendanceRecord },
  CheckedOut { record: AttendanceRecord, remote: bool },
  AchievementUnlocked { unlock: AchievementUnlock },
}

#[derive(Debug, Clone)]
pub struct EventFeed {
  tx: broadcast::Sender<AttendanceEvent>,
}

impl Default for EventFeed {
  fn default() -> Self { Self::new(256) }
}

impl EventFeed {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<AttendanceEvent> {
    self.tx.subscribe()
  }

  pub fn publish(&self, event: AttendanceEvent) {
    // Err only means nobody is listening right now.
    let _ = self.tx.send(event);
  }
}
