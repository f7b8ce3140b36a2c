// 用户实体

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 用户实体，订单中的买家与餐厅店主都引用它
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub username: String,
    pub email: String,
}
