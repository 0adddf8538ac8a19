//! The rotating token shown on the kiosk screen.
//!
//! A background task re-derives the token from the clock on every tick and
//! republishes it when the window changes. Readers get a cheap snapshot from a
//! `watch` channel; the value is only ever replaced whole.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ruag_core::token::{TokenCodec, window_of};
use serde::Serialize;
use tokio::{
  sync::watch,
  task::JoinHandle,
  time::{MissedTickBehavior, interval},
};

pub const DEFAULT_REFRESH: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KioskToken {
  pub token:  String,
  pub window: i64,
}

impl KioskToken {
  pub fn at(codec: &TokenCodec, now: DateTime<Utc>) -> Self {
    let window = window_of(now);
    Self { token: codec.encode_window(window), window }
  }
}

/// Owns the refresh task; dropping it stops the task.
pub struct KioskBroadcaster {
  rx:   watch::Receiver<KioskToken>,
  task: JoinHandle<()>,
}

impl KioskBroadcaster {
  pub fn spawn(codec: TokenCodec, refresh: Duration) -> Self {
    Self::spawn_with_clock(codec, refresh, Utc::now)
  }

  /// Like [`spawn`](Self::spawn) but reading time from `clock`.
  pub fn spawn_with_clock<C>(codec: TokenCodec, refresh: Duration, clock: C) -> Self
  where
    C: Fn() -> DateTime<Utc> + Send + 'static,
  {
    let (tx, rx) = watch::channel(KioskToken::at(&codec, clock()));

    let task = tokio::spawn(async move {
      let mut ticker = interval(refresh.max(Duration::from_millis(1)));
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        let next = KioskToken::at(&codec, clock());
        let rotated = tx.send_if_modified(|current| {
          if current.window == next.window {
            return false;
          }
          *current = next.clone();
          true
        });
        if rotated {
          tracing::debug!(window = next.window, "kiosk token rotated");
        }
      }
    });

    Self { rx, task }
  }

  /// The token to display right now.
  pub fn current(&self) -> KioskToken { self.rx.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<KioskToken> { self.rx.clone() }
}

impl Drop for KioskBroadcaster {
  fn drop(&mut self) { self.task.abort(); }
}
