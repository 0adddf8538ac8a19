//! `GET /achievements/{person_id}`: every achievement the person holds,
//! oldest unlock first.

use axum::{
  Json,
  extract::{Path, State},
};
use ruag_core::achievement::AchievementUnlock;

use crate::{AppState, AppStore, error::ApiError, parse_person};

pub async fn list<S: AppStore>(
  State(state): State<AppState<S>>,
  Path(person_id): Path<String>,
) -> Result<Json<Vec<AchievementUnlock>>, ApiError> {
  let person_id = parse_person(&person_id)?;
  Ok(Json(state.flow.unlocks(&person_id).await?))
}
