use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::types::CreateUserRequest;
use crate::{AppState, database::entities::UserEntity, error::AppResult};

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserEntity>)> {
    let user = state.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserEntity>> {
    Ok(Json(state.users.get_by_id(id).await?))
}
