// 餐厅实体

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 未指定时餐厅的默认桌数
pub const DEFAULT_TABLE_COUNT: i32 = 10;

/// 餐厅实体，对应数据库中的 restaurants 表
///
/// 每个店主最多拥有一家餐厅，由创建流程保证。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantEntity {
    /// 餐厅ID，首次保存前为 0
    pub id: i64,
    /// 餐厅名称
    pub name: String,
    /// 店主用户ID
    pub owner_id: Option<i64>,
    /// 桌数，至少为 1
    pub table_count: i32,
    /// 封面图
    pub cover: Option<String>,
    /// 餐厅描述
    pub description: Option<String>,
}

impl RestaurantEntity {
    /// 桌号是否落在 1..=table_count 之内
    pub fn has_table(&self, table_number: i32) -> bool {
        (1..=self.table_count).contains(&table_number)
    }
}
