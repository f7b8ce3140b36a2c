use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::types::{CreateRestaurantRequest, PublicMenuResponse, UpdateRestaurantRequest};
use crate::{AppState, database::entities::RestaurantEntity, error::AppResult};

pub async fn list_restaurants(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RestaurantEntity>>> {
    let listing = state.restaurants.get_all().await?;
    Ok(Json(listing.as_ref().clone()))
}

pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RestaurantEntity>> {
    Ok(Json(state.restaurants.get_by_id(id).await?))
}

pub async fn get_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
) -> AppResult<Json<RestaurantEntity>> {
    Ok(Json(state.restaurants.get_by_owner(owner_id).await?))
}

pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(req): Json<CreateRestaurantRequest>,
) -> AppResult<(StatusCode, Json<RestaurantEntity>)> {
    let restaurant = state.restaurants.create_with_owner(req).await?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRestaurantRequest>,
) -> AppResult<Json<RestaurantEntity>> {
    Ok(Json(state.restaurants.update(id, req).await?))
}

pub async fn public_menu(
    State(state): State<AppState>,
    Path((restaurant_id, table_number)): Path<(i64, i32)>,
) -> AppResult<Json<PublicMenuResponse>> {
    Ok(Json(
        state
            .restaurants
            .public_menu(restaurant_id, table_number)
            .await?,
    ))
}
