use std::sync::Arc;

use crate::cache::RestaurantCache;
use crate::database::Repositories;
use crate::database::entities::RestaurantEntity;
use crate::database::entities::restaurant::DEFAULT_TABLE_COUNT;
use crate::error::{AppError, AppResult};

use super::types::{
    CreateRestaurantRequest, PublicMenuResponse, PublicRestaurant, UpdateRestaurantRequest,
};

/// 餐厅服务
///
/// 读路径走缓存；每次写入后先刷新缓存再返回。
pub struct RestaurantService {
    repos: Repositories,
    cache: RestaurantCache,
    max_table_count: i32,
}

impl RestaurantService {
    pub fn new(repos: Repositories, cache: RestaurantCache, max_table_count: i32) -> Self {
        Self {
            repos,
            cache,
            max_table_count,
        }
    }

    pub async fn get_all(&self) -> AppResult<Arc<Vec<RestaurantEntity>>> {
        self.cache.get_all().await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<RestaurantEntity> {
        self.repos
            .restaurants
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Restaurant not found"))
    }

    pub async fn get_by_owner(&self, owner_id: i64) -> AppResult<RestaurantEntity> {
        self.cache.get_by_owner(owner_id).await
    }

    pub async fn create_with_owner(
        &self,
        req: CreateRestaurantRequest,
    ) -> AppResult<RestaurantEntity> {
        let owner_id = req
            .owner_id
            .ok_or_else(|| AppError::invalid("ownerId is required"))?;
        if !self.repos.users.exists_by_id(owner_id).await? {
            return Err(AppError::not_found("User not found"));
        }

        // 一个用户只能拥有一家餐厅
        if self
            .repos
            .restaurants
            .find_by_owner_id(owner_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User already owns a restaurant".to_string(),
            ));
        }

        let name = req
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::invalid("Restaurant name is required"))?;
        let table_count = req.table_count.unwrap_or(DEFAULT_TABLE_COUNT);
        self.check_table_count(table_count)?;

        let restaurant = RestaurantEntity {
            id: 0,
            name,
            owner_id: Some(owner_id),
            table_count,
            cover: req.cover,
            description: req.description,
        };

        let saved = self.repos.restaurants.save(restaurant).await?;
        self.cache.write_through(&saved);
        tracing::info!("Restaurant {} created for owner {}", saved.id, owner_id);
        Ok(saved)
    }

    pub async fn update(&self, id: i64, req: UpdateRestaurantRequest) -> AppResult<RestaurantEntity> {
        let mut existing = self.get_by_id(id).await?;

        if let Some(name) = req.name {
            existing.name = name;
        }
        if let Some(description) = req.description {
            existing.description = Some(description);
        }
        if let Some(cover) = req.cover {
            existing.cover = Some(cover);
        }
        if let Some(table_count) = req.table_count {
            self.check_table_count(table_count)?;
            existing.table_count = table_count;
        }

        let saved = self.repos.restaurants.save(existing).await?;
        self.cache.write_through(&saved);
        tracing::info!("Restaurant {} updated", saved.id);
        Ok(saved)
    }

    /// 按桌号打开的公开菜单
    pub async fn public_menu(
        &self,
        restaurant_id: i64,
        table_number: i32,
    ) -> AppResult<PublicMenuResponse> {
        let restaurant = self.get_by_id(restaurant_id).await?;
        if !restaurant.has_table(table_number) {
            return Err(AppError::invalid(format!(
                "Invalid table number. This restaurant has {} tables.",
                restaurant.table_count
            )));
        }

        let items = self.repos.items.find_by_restaurant_id(restaurant_id).await?;
        Ok(PublicMenuResponse {
            restaurant: PublicRestaurant::from(&restaurant),
            table_number,
            items,
        })
    }

    fn check_table_count(&self, table_count: i32) -> AppResult<()> {
        if table_count < 1 {
            return Err(AppError::invalid("Table count must be at least 1"));
        }
        if table_count > self.max_table_count {
            return Err(AppError::invalid(format!(
                "Table count cannot exceed {}",
                self.max_table_count
            )));
        }
        Ok(())
    }
}
