use serde::{Deserialize, Serialize};

use crate::database::entities::{ItemEntity, RestaurantEntity};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantRequest {
    pub owner_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub table_count: Option<i32>,
}

/// 部分更新，未提供的字段保持不变
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub table_count: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicRestaurant {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub cover: String,
}

impl From<&RestaurantEntity> for PublicRestaurant {
    fn from(restaurant: &RestaurantEntity) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name.clone(),
            description: restaurant.description.clone().unwrap_or_default(),
            cover: restaurant.cover.clone().unwrap_or_default(),
        }
    }
}

/// 扫码点餐页面的数据
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenuResponse {
    pub restaurant: PublicRestaurant,
    pub table_number: i32,
    pub items: Vec<ItemEntity>,
}
