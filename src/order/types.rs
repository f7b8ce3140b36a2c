use serde::{Deserialize, Serialize};

use crate::database::entities::{OrderEntity, OrderLineEntity};
use crate::error::{AppError, AppResult};

use super::aggregator::{CreateOrderCommand, OrderLineRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub item_id: Option<i64>,
    pub quantity: Option<i32>,
}

/// 下单请求体，必填字段缺失时返回 400 而不是反序列化错误
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(alias = "userId")]
    pub buyer_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub table_number: Option<i32>,
    pub guest_name: Option<String>,
    pub items: Option<Vec<CreateOrderItemRequest>>,
}

impl CreateOrderRequest {
    pub fn into_command(self) -> AppResult<CreateOrderCommand> {
        let restaurant_id = self
            .restaurant_id
            .ok_or_else(|| AppError::invalid("restaurantId is required"))?;
        let items = self
            .items
            .ok_or_else(|| AppError::invalid("Order must contain at least 1 item"))?;

        let lines = items
            .into_iter()
            .map(|item| {
                let item_id = item
                    .item_id
                    .ok_or_else(|| AppError::invalid("itemId is required"))?;
                // 数量缺失按 0 处理，交给聚合器报告范围错误
                Ok(OrderLineRequest {
                    item_id,
                    quantity: item.quantity.unwrap_or(0),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(CreateOrderCommand {
            buyer_id: self.buyer_id,
            restaurant_id,
            table_number: self.table_number,
            guest_name: self.guest_name.filter(|name| !name.trim().is_empty()),
            lines,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderItemDto {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub quantity: i32,
}

/// 订单响应，金额以十进制字符串输出，创建时间为毫秒时间戳
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i64,
    pub table_number: Option<i32>,
    pub guest_name: Option<String>,
    pub total: String,
    pub status: String,
    pub items: Vec<OrderItemDto>,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order: OrderDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<&OrderLineEntity> for OrderItemDto {
    fn from(line: &OrderLineEntity) -> Self {
        Self {
            id: line.id,
            name: line.name.clone(),
            price: line.price.to_string(),
            quantity: line.quantity,
        }
    }
}

impl From<OrderEntity> for OrderDto {
    fn from(order: OrderEntity) -> Self {
        Self {
            id: order.id,
            table_number: order.table_number,
            guest_name: order.guest_name,
            total: order.total.to_string(),
            status: order.status.to_string(),
            items: order.lines.iter().map(OrderItemDto::from).collect(),
            created_at: order.created_at.timestamp_millis(),
        }
    }
}
