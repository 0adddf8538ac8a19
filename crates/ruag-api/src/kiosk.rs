//! `GET /kiosk/token`: the token the kiosk screen should render as a QR code.

use axum::{Json, extract::State};
use ruag_attendance::kiosk::KioskToken;

use crate::{AppState, AppStore};

pub async fn token<S: AppStore>(State(state): State<AppState<S>>) -> Json<KioskToken> {
  Json(state.kiosk.current())
}
