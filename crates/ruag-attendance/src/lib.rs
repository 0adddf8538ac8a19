//! Check-in orchestration for RUAG.
//!
//! [`flow::AttendanceFlow`] runs a scanned token and a device position through
//! token validation, the geofence, on-time classification and the store, and
//! then hands the new record to the [`achievements::AchievementEngine`].
//! [`kiosk::KioskBroadcaster`] keeps the token the kiosk displays fresh, and
//! [`scanner::Scanner`] is the per-device session that drives a check-in from
//! a scan.

pub mod achievements;
pub mod error;
pub mod events;
pub mod flow;
pub mod kiosk;
pub mod location;
pub mod scanner;

pub use error::{Error, Result};
pub use flow::{AttendanceFlow, CheckIn, FlowConfig};

#[cfg(test)]
mod testutil;
