//! Handlers for `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/profiles/{person_id}` | Body: `{"full_name":"..","area":"..","photo_ref":null}`; replaces any previous profile |
//! | `GET`  | `/profiles/{person_id}` | 404 if not registered |

use axum::{
  Json,
  extract::{Path, State},
};
use ruag_core::{person::Profile, store::ProfileStore};
use serde::Deserialize;

use crate::{AppState, AppStore, error::ApiError, parse_person};

#[derive(Debug, Deserialize)]
pub struct ProfileBody {
  pub full_name: String,
  pub area:      String,
  #[serde(default)]
  pub photo_ref: Option<String>,
}

/// `PUT /profiles/{person_id}`
pub async fn upsert<S: AppStore>(
  State(state): State<AppState<S>>,
  Path(person_id): Path<String>,
  Json(body): Json<ProfileBody>,
) -> Result<Json<Profile>, ApiError> {
  let person_id = parse_person(&person_id)?;
  let profile = Profile::new(person_id, body.full_name, body.area, body.photo_ref)?;
  let saved = state
    .store()
    .upsert_profile(profile)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(person_id = %saved.person_id, area = %saved.area, "profile registered");
  Ok(Json(saved))
}

/// `GET /profiles/{person_id}`
pub async fn get_one<S: AppStore>(
  State(state): State<AppState<S>>,
  Path(person_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
  let person_id = parse_person(&person_id)?;
  let profile = state
    .store()
    .get_profile(person_id.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {person_id} is not registered")))?;
  Ok(Json(profile))
}
