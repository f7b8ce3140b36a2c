use rust_decimal::Decimal;

use crate::database::Repositories;
use crate::database::entities::ItemEntity;
use crate::error::{AppError, AppResult};

use super::types::{CreateItemRequest, UpdateItemRequest};

/// 菜单菜品管理
///
/// 写操作都要求 `user_id` 是菜品所属餐厅的店主。
pub struct ItemService {
    repos: Repositories,
}

fn non_blank(name: String) -> AppResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::invalid("Item name is required"));
    }
    Ok(name)
}

fn positive(price: Decimal) -> AppResult<Decimal> {
    if price <= Decimal::ZERO {
        return Err(AppError::invalid("Price must be greater than zero"));
    }
    Ok(price)
}

impl ItemService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn create(&self, req: CreateItemRequest) -> AppResult<ItemEntity> {
        let name = non_blank(req.name.unwrap_or_default())?;
        let price = positive(
            req.price
                .ok_or_else(|| AppError::invalid("Price must be greater than zero"))?,
        )?;
        let user_id = req
            .user_id
            .ok_or_else(|| AppError::invalid("userId is required"))?;
        if !self.repos.users.exists_by_id(user_id).await? {
            return Err(AppError::not_found("User not found"));
        }
        let restaurant_id = req
            .restaurant_id
            .ok_or_else(|| AppError::invalid("restaurantId is required"))?;
        self.ensure_owner(Some(restaurant_id), user_id).await?;

        let item = ItemEntity {
            id: 0,
            restaurant_id: Some(restaurant_id),
            name,
            description: req.description,
            price,
            category: req.category,
            image: req.image,
        };
        let saved = self.repos.items.save(item).await?;
        tracing::info!("Item {} created for restaurant {}", saved.id, restaurant_id);
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<ItemEntity> {
        self.repos
            .items
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item not found: {}", id)))
    }

    pub async fn list_by_restaurant(&self, restaurant_id: i64) -> AppResult<Vec<ItemEntity>> {
        Ok(self.repos.items.find_by_restaurant_id(restaurant_id).await?)
    }

    pub async fn update(&self, id: i64, req: UpdateItemRequest) -> AppResult<ItemEntity> {
        let mut item = self.get_by_id(id).await?;
        let user_id = req
            .user_id
            .ok_or_else(|| AppError::invalid("userId is required"))?;
        self.ensure_owner(item.restaurant_id, user_id).await?;

        if let Some(name) = req.name {
            item.name = non_blank(name)?;
        }
        if let Some(price) = req.price {
            item.price = positive(price)?;
        }
        if let Some(description) = req.description {
            item.description = Some(description);
        }
        if let Some(category) = req.category {
            item.category = Some(category);
        }
        if let Some(image) = req.image {
            item.image = Some(image);
        }

        let saved = self.repos.items.save(item).await?;
        tracing::info!("Item {} updated", saved.id);
        Ok(saved)
    }

    /// 已被订单引用的菜品不能删除
    pub async fn delete(&self, id: i64, user_id: Option<i64>) -> AppResult<()> {
        let item = self.get_by_id(id).await?;
        let user_id = user_id.ok_or_else(|| AppError::invalid("userId is required"))?;
        self.ensure_owner(item.restaurant_id, user_id).await?;

        let references = self.repos.orders.count_lines_by_item_id(id).await?;
        if references > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete item {} because it is referenced in {} order(s)",
                id, references
            )));
        }

        self.repos.items.delete_by_id(id).await?;
        tracing::info!("Item {} deleted", id);
        Ok(())
    }

    async fn ensure_owner(&self, restaurant_id: Option<i64>, user_id: i64) -> AppResult<()> {
        let restaurant_id =
            restaurant_id.ok_or_else(|| AppError::invalid("Item has no restaurant"))?;
        let restaurant = self
            .repos
            .restaurants
            .find_by_id(restaurant_id)
            .await?
            .ok_or_else(|| AppError::not_found("Restaurant not found"))?;
        if restaurant.owner_id != Some(user_id) {
            return Err(AppError::invalid("User does not own this restaurant"));
        }
        Ok(())
    }
}
