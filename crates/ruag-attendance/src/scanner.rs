//! One device's scanning session.
//!
//! `Scanning → Validating → Succeeded | Failed`. Only one scan is validated at
//! a time: a scan that arrives while another is in flight is dropped, not
//! queued. A failure stays on screen for a short display window and then the
//! session goes back to scanning on its own. A success ends the session.

use std::{
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use ruag_core::{
  person::Profile,
  record::{AttendanceRecord, DayState},
  store::AttendanceStore,
};

use crate::{AttendanceFlow, CheckIn, Result, location::LocationProvider};

pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, PartialEq)]
pub enum ScanPhase {
  Scanning,
  Validating,
  Succeeded(AttendanceRecord),
  Failed {
    code:    &'static str,
    message: String,
    since:   Instant,
  },
}

#[derive(Debug)]
pub enum ScanOutcome {
  /// The scan was dropped: busy, showing an error, or already done.
  Ignored,
  Completed(Result<CheckIn>),
}

pub struct Scanner<S, L> {
  flow:          AttendanceFlow<S>,
  profile:       Profile,
  locator:       L,
  busy:          AtomicBool,
  phase:         Mutex<ScanPhase>,
  error_display: Duration,
}

/// Clears the busy flag when the in-flight scan finishes, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

impl<S: AttendanceStore, L: LocationProvider> Scanner<S, L> {
  pub fn new(flow: AttendanceFlow<S>, profile: Profile, locator: L) -> Self {
    Self {
      flow,
      profile,
      locator,
      busy: AtomicBool::new(false),
      phase: Mutex::new(ScanPhase::Scanning),
      error_display: DEFAULT_ERROR_DISPLAY,
    }
  }

  pub fn with_error_display(mut self, window: Duration) -> Self {
    self.error_display = window;
    self
  }

  /// Start from today's state: someone already checked in skips scanning.
  pub async fn resume(&self, now: DateTime<Utc>) -> Result<ScanPhase> {
    let phase = match self.flow.day_state(&self.profile.person_id, now).await? {
      DayState::NotCheckedIn => ScanPhase::Scanning,
      DayState::CheckedIn(record) | DayState::CheckedOut(record) => {
        ScanPhase::Succeeded(record)
      }
    };
    self.set_phase(phase.clone());
    Ok(phase)
  }

  /// Handle one decoded QR payload.
  pub async fn submit(&self, token: &str, now: DateTime<Utc>) -> ScanOutcome {
    if self
      .busy
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      tracing::debug!(person_id = %self.profile.person_id, "scan ignored while busy");
      return ScanOutcome::Ignored;
    }
    let _guard = BusyGuard(&self.busy);
    // Checked under the gate so a scan finishing just before cannot be overrun.
    if !self.accepting(Instant::now()) {
      return ScanOutcome::Ignored;
    }

    self.set_phase(ScanPhase::Validating);
    let result = self.flow.check_in(&self.profile, token, &self.locator, now).await;
    self.set_phase(match &result {
      Ok(check_in) => ScanPhase::Succeeded(check_in.record.clone()),
      Err(e) => ScanPhase::Failed {
        code:    e.code(),
        message: e.to_string(),
        since:   Instant::now(),
      },
    });
    ScanOutcome::Completed(result)
  }

  pub fn phase(&self) -> ScanPhase { self.phase_at(Instant::now()) }

  /// The phase as displayed at `at`; an expired failure reads as scanning.
  pub fn phase_at(&self, at: Instant) -> ScanPhase {
    let phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
    match &*phase {
      ScanPhase::Failed { since, .. }
        if at.saturating_duration_since(*since) >= self.error_display =>
      {
        ScanPhase::Scanning
      }
      other => other.clone(),
    }
  }

  /// Whether a scan arriving at `at` would be looked at.
  pub fn accepting(&self, at: Instant) -> bool {
    matches!(self.phase_at(at), ScanPhase::Scanning | ScanPhase::Validating)
  }

  fn set_phase(&self, next: ScanPhase) {
    *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
  }
}
