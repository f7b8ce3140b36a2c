// 菜品实体

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 菜品实体，对应数据库中的 items 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemEntity {
    pub id: i64,
    /// 所属餐厅
    pub restaurant_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    /// 单价，以字符串形式序列化以避免精度丢失
    pub price: Decimal,
    pub category: Option<String>,
    pub image: Option<String>,
}
