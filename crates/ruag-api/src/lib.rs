//! JSON API for RUAG attendance.
//!
//! Exposes an axum [`Router`] backed by any store that implements both
//! [`AttendanceStore`] and [`ProfileStore`]. TLS and authentication are the
//! deployment's concern.

pub mod achievements;
pub mod attendance;
pub mod error;
pub mod kiosk;
pub mod profiles;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use ruag_attendance::{
  AttendanceFlow, FlowConfig, kiosk::KioskBroadcaster,
};
use ruag_core::{
  person::PersonId,
  policy::AttendancePolicy,
  store::{AttendanceStore, ProfileStore},
  token::{DEFAULT_PREFIX, TokenCodec},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `RUAG__*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub token_prefix:          String,
  /// How long to wait for a device position before giving up.
  pub location_timeout_secs: u64,
  pub kiosk_refresh_millis:  u64,
  pub policy:                AttendancePolicy,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".into(),
      port:                  8080,
      store_path:            PathBuf::from("ruag.db"),
      token_prefix:          DEFAULT_PREFIX.into(),
      location_timeout_secs: 12,
      kiosk_refresh_millis:  1000,
      policy:                AttendancePolicy::default(),
    }
  }
}

impl ServerConfig {
  pub fn codec(&self) -> TokenCodec { TokenCodec::new(self.token_prefix.clone()) }

  pub fn kiosk_refresh(&self) -> Duration { Duration::from_millis(self.kiosk_refresh_millis) }

  pub fn flow_config(&self) -> FlowConfig {
    FlowConfig {
      policy:           self.policy.clone(),
      codec:            self.codec(),
      location_timeout: Duration::from_secs(self.location_timeout_secs),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// A backend the API can serve from.
pub trait AppStore: AttendanceStore + ProfileStore + 'static {}

impl<S: AttendanceStore + ProfileStore + 'static> AppStore for S {}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub flow:  AttendanceFlow<S>,
  pub kiosk: Arc<KioskBroadcaster>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { flow: self.flow.clone(), kiosk: Arc::clone(&self.kiosk) }
  }
}

impl<S: AppStore> AppState<S> {
  /// Build the flow and start the kiosk refresh task.
  pub fn new(store: Arc<S>, config: &ServerConfig) -> ruag_core::Result<Self> {
    let flow = AttendanceFlow::new(store, config.flow_config())?;
    let kiosk = KioskBroadcaster::spawn(config.codec(), config.kiosk_refresh());
    Ok(Self { flow, kiosk: Arc::new(kiosk) })
  }

  pub fn store(&self) -> &S { self.flow.store() }
}

pub(crate) fn parse_person(raw: &str) -> Result<PersonId, ApiError> {
  Ok(PersonId::parse(raw)?)
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S: AppStore>(state: AppState<S>) -> Router {
  Router::new()
    // Kiosk
    .route("/kiosk/token", get(kiosk::token::<S>))
    // Profiles
    .route("/profiles/{person_id}", get(profiles::get_one::<S>).put(profiles::upsert::<S>))
    // Attendance
    .route("/attendance", get(attendance::roster::<S>))
    .route("/attendance/summary", get(attendance::summary::<S>))
    .route("/attendance/check-in", post(attendance::check_in::<S>))
    .route("/attendance/check-out", post(attendance::check_out::<S>))
    .route("/attendance/today/{person_id}", get(attendance::today::<S>))
    // Achievements
    .route("/achievements/{person_id}", get(achievements::list::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::Utc;
  use ruag_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(Arc::new(store), &ServerConfig::default()).unwrap()
  }

  async fn call(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn register(state: &AppState<SqliteStore>, id: &str) {
    let (status, _) = call(
      state,
      "PUT",
      &format!("/profiles/{id}"),
      Some(json!({ "full_name": "Ana Quispe", "area": "Logística" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  fn office() -> Value {
    let o = AttendancePolicy::default().office;
    json!({ "latitude": o.latitude, "longitude": o.longitude })
  }

  async fn kiosk_token(state: &AppState<SqliteStore>) -> String {
    let (status, body) = call(state, "GET", "/kiosk/token", None).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_owned()
  }

  async fn check_in(state: &AppState<SqliteStore>, id: &str, position: Value) -> (StatusCode, Value) {
    let token = kiosk_token(state).await;
    call(
      state,
      "POST",
      "/attendance/check-in",
      Some(json!({ "person_id": id, "token": token, "position": position })),
    )
    .await
  }

  // ── Kiosk ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn kiosk_token_is_current() {
    let state = make_state().await;
    let (_, body) = call(&state, "GET", "/kiosk/token", None).await;
    let token = body["token"].as_str().unwrap();
    assert!(token.starts_with("RUAG_INGRESO_"));
    assert!(state.flow.codec().validate(token, Utc::now()).is_ok());
    assert!(body["window"].is_i64());
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn profile_round_trip() {
    let state = make_state().await;
    register(&state, "12345678").await;

    let (status, body) = call(&state, "GET", "/profiles/12345678", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["full_name"], "Ana Quispe");
    assert_eq!(body["person_id"], "12345678");
  }

  #[tokio::test]
  async fn unknown_profile_is_404() {
    let state = make_state().await;
    let (status, body) = call(&state, "GET", "/profiles/87654321", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
  }

  #[tokio::test]
  async fn malformed_person_id_is_400() {
    let state = make_state().await;
    let (status, body) = call(&state, "GET", "/profiles/12ab", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
  }

  #[tokio::test]
  async fn blank_profile_fields_are_400() {
    let state = make_state().await;
    let (status, _) = call(
      &state,
      "PUT",
      "/profiles/12345678",
      Some(json!({ "full_name": "  ", "area": "Rrhh" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Check-in ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn check_in_creates_then_returns_existing() {
    let state = make_state().await;
    register(&state, "12345678").await;

    let (status, body) = check_in(&state, "12345678", office()).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["created"], true);
    let id = body["record"]["id"].clone();

    let (status, body) = check_in(&state, "12345678", office()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert_eq!(body["record"]["id"], id);
    assert_eq!(body["unlocked"], json!([]));
  }

  #[tokio::test]
  async fn check_in_for_unregistered_person_is_404() {
    let state = make_state().await;
    let (status, _) = check_in(&state, "12345678", office()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn check_in_error_codes() {
    let state = make_state().await;
    register(&state, "12345678").await;

    let (status, body) = call(
      &state,
      "POST",
      "/attendance/check-in",
      Some(json!({ "person_id": "12345678", "token": "RUAG_INGRESO_abc", "position": office() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "TOKEN_MALFORMED");

    let (status, body) = call(
      &state,
      "POST",
      "/attendance/check-in",
      Some(json!({ "person_id": "12345678", "token": "RUAG_INGRESO_1" , "position": office() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "TOKEN_EXPIRED");

    let (status, body) = check_in(&state, "12345678", Value::Null).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "LOCATION_UNAVAILABLE");

    let far = json!({ "latitude": -12.0, "longitude": -77.0 });
    let (status, body) = check_in(&state, "12345678", far).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "OUT_OF_RANGE");
    assert!(body["distance_m"].as_u64().unwrap() > 1000);
  }

  // ── Check-out ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn check_out_without_check_in_is_409() {
    let state = make_state().await;
    let (status, body) = call(
      &state,
      "POST",
      "/attendance/check-out",
      Some(json!({ "person_id": "12345678", "position": office() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NOT_CHECKED_IN");
  }

  #[tokio::test]
  async fn remote_check_out_needs_note() {
    let state = make_state().await;
    register(&state, "12345678").await;
    check_in(&state, "12345678", office()).await;

    let away = json!({ "latitude": -12.12, "longitude": -77.03 });
    let (status, body) = call(
      &state,
      "POST",
      "/attendance/check-out",
      Some(json!({ "person_id": "12345678", "position": away })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "NOTE_REQUIRED");

    let (status, body) = call(
      &state,
      "POST",
      "/attendance/check-out",
      Some(json!({ "person_id": "12345678", "position": away, "note": "visita a obra" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"], "visita a obra [REMOTO:-12.12,-77.03]");

    let (_, today) = call(&state, "GET", "/attendance/today/12345678", None).await;
    assert_eq!(today["state"], "checked_out");
  }

  #[tokio::test]
  async fn note_with_remote_marker_is_refused() {
    let state = make_state().await;
    register(&state, "12345678").await;
    check_in(&state, "12345678", office()).await;

    let (status, body) = call(
      &state,
      "POST",
      "/attendance/check-out",
      Some(json!({
        "person_id": "12345678",
        "position": office(),
        "note": "bye [REMOTO:0.0,0.0]",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "NOTE_INVALID");

    let (_, today) = call(&state, "GET", "/attendance/today/12345678", None).await;
    assert_eq!(today["state"], "checked_in");
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn roster_summary_and_achievements() {
    let state = make_state().await;
    for id in ["11111111", "22222222"] {
      register(&state, id).await;
      let (status, _) = check_in(&state, id, office()).await;
      assert_eq!(status, StatusCode::CREATED);
    }
    let date = state.flow.today(Utc::now());

    let (status, roster) = call(&state, "GET", &format!("/attendance?date={date}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.as_array().unwrap().len(), 2);

    let (_, summary) = call(&state, "GET", "/attendance/summary", None).await;
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["date"], date.to_string());

    // Two check-ins out of at most ten: both are pioneers.
    let (status, unlocks) = call(&state, "GET", "/achievements/22222222", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = unlocks
      .as_array()
      .unwrap()
      .iter()
      .map(|u| u["achievement_id"].as_str().unwrap().to_owned())
      .collect();
    assert!(ids.contains(&"pioneer".to_owned()), "{ids:?}");
  }

  #[tokio::test]
  async fn today_before_check_in() {
    let state = make_state().await;
    let (status, body) = call(&state, "GET", "/attendance/today/12345678", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "not_checked_in");
  }

  #[test]
  fn config_defaults() {
    let cfg = ServerConfig::default();
    assert_eq!(cfg.flow_config().location_timeout, Duration::from_secs(12));
    assert_eq!(cfg.codec().prefix(), "RUAG_INGRESO");
    assert_eq!(cfg.policy.radius_m, 50.0);
  }
}
