use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::types::{CreateOrderRequest, CreateOrderResponse, MessageResponse, OrderDto};
use crate::{AppState, error::AppResult};

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<CreateOrderResponse>)> {
    let command = req.into_command()?;
    let order = state.orders.create_order(command).await.inspect_err(|e| {
        tracing::warn!("Order rejected: {}", e);
    })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order: order.into(),
        }),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDto>> {
    let order = state.orders.get_by_id(id).await?;
    Ok(Json(order.into()))
}

pub async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<OrderDto>>> {
    let orders = state.orders.get_by_buyer(user_id).await?;
    Ok(Json(orders.into_iter().map(OrderDto::from).collect()))
}

pub async fn list_by_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<i64>,
) -> AppResult<Json<Vec<OrderDto>>> {
    let orders = state.orders.get_by_restaurant(restaurant_id).await?;
    Ok(Json(orders.into_iter().map(OrderDto::from).collect()))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    state.orders.delete_order(id).await?;
    Ok(Json(MessageResponse {
        message: "Order removed".to_string(),
    }))
}
