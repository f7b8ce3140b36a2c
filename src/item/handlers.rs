use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::types::{CreateItemRequest, OwnerQuery, UpdateItemRequest};
use crate::{AppState, database::entities::ItemEntity, error::AppResult};

pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<ItemEntity>)> {
    let item = state.items.create(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ItemEntity>> {
    Ok(Json(state.items.get_by_id(id).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> AppResult<Json<ItemEntity>> {
    Ok(Json(state.items.update(id, req).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(owner): Query<OwnerQuery>,
) -> AppResult<StatusCode> {
    state.items.delete(id, owner.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_by_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<i64>,
) -> AppResult<Json<Vec<ItemEntity>>> {
    Ok(Json(state.items.list_by_restaurant(restaurant_id).await?))
}
