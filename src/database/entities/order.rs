// 订单实体
// 订单与订单行总是一起写入、一起删除

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 订单状态，目前只有创建后的待处理状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// 订单实体，对应 orders 表；订单行单独存放在 order_items 表
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderEntity {
    pub id: i64,
    pub buyer_id: Option<i64>,
    pub restaurant_id: i64,
    pub table_number: Option<i32>,
    /// 未登录下单时的顾客名
    pub guest_name: Option<String>,
    pub total: Decimal,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub lines: Vec<OrderLineEntity>,
}

/// 订单行，名称与单价是下单时刻的快照
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderLineEntity {
    pub id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// 尚未持久化的订单，由订单聚合器组装完成后一次性写入
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub buyer_id: Option<i64>,
    pub restaurant_id: i64,
    pub table_number: Option<i32>,
    pub guest_name: Option<String>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub item_id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}
