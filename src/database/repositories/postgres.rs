// Postgres 存储
// 使用运行时校验的 query_as，表结构见 migrations/0001_init.sql

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ItemStore, OrderStore, RestaurantStore, StorageResult, UserStore};
use crate::database::entities::{
    ItemEntity, NewOrder, OrderEntity, OrderLineEntity, RestaurantEntity, UserEntity,
};

const RESTAURANT_COLUMNS: &str = "id, name, owner_id, table_count, cover, description";
const ITEM_COLUMNS: &str = "id, restaurant_id, name, description, price, category, image";
const ORDER_COLUMNS: &str =
    "id, buyer_id, restaurant_id, table_number, guest_name, total, status, created_at";
const LINE_COLUMNS: &str = "id, order_id, item_id, name, price, quantity";

/// Postgres 存储库，处理所有实体的数据库读写
pub struct PgStore {
    db: Arc<PgPool>,
}

impl PgStore {
    /// 创建新的存储库实例
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }

    /// 为一批订单装载订单行
    async fn attach_lines(&self, mut orders: Vec<OrderEntity>) -> StorageResult<Vec<OrderEntity>> {
        if orders.is_empty() {
            return Ok(orders);
        }
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let lines = sqlx::query_as::<_, OrderLineEntity>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&ids[..])
        .fetch_all(&*self.db)
        .await?;

        let mut by_order: HashMap<i64, Vec<OrderLineEntity>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id).or_default().push(line);
        }
        for order in &mut orders {
            order.lines = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(orders)
    }
}

#[async_trait]
impl RestaurantStore for PgStore {
    async fn find_all(&self) -> StorageResult<Vec<RestaurantEntity>> {
        let restaurants = sqlx::query_as::<_, RestaurantEntity>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants ORDER BY id"
        ))
        .fetch_all(&*self.db)
        .await?;
        Ok(restaurants)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<RestaurantEntity>> {
        let restaurant = sqlx::query_as::<_, RestaurantEntity>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(restaurant)
    }

    async fn find_by_owner_id(&self, owner_id: i64) -> StorageResult<Option<RestaurantEntity>> {
        let restaurant = sqlx::query_as::<_, RestaurantEntity>(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE owner_id = $1 ORDER BY id LIMIT 1"
        ))
        .bind(owner_id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(restaurant)
    }

    async fn save(&self, restaurant: RestaurantEntity) -> StorageResult<RestaurantEntity> {
        let query = if restaurant.id == 0 {
            format!(
                "INSERT INTO restaurants (name, owner_id, table_count, cover, description) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {RESTAURANT_COLUMNS}"
            )
        } else {
            format!(
                "UPDATE restaurants SET name = $1, owner_id = $2, table_count = $3, cover = $4, \
                 description = $5 WHERE id = $6 RETURNING {RESTAURANT_COLUMNS}"
            )
        };

        let mut statement = sqlx::query_as::<_, RestaurantEntity>(&query)
            .bind(&restaurant.name)
            .bind(restaurant.owner_id)
            .bind(restaurant.table_count)
            .bind(&restaurant.cover)
            .bind(&restaurant.description);
        if restaurant.id != 0 {
            statement = statement.bind(restaurant.id);
        }

        let saved = statement.fetch_one(&*self.db).await?;
        tracing::debug!("Saved restaurant {}", saved.id);
        Ok(saved)
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<ItemEntity>> {
        let item = sqlx::query_as::<_, ItemEntity>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(item)
    }

    async fn find_by_restaurant_id(&self, restaurant_id: i64) -> StorageResult<Vec<ItemEntity>> {
        let items = sqlx::query_as::<_, ItemEntity>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE restaurant_id = $1 ORDER BY id"
        ))
        .bind(restaurant_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(items)
    }

    async fn save(&self, item: ItemEntity) -> StorageResult<ItemEntity> {
        let query = if item.id == 0 {
            format!(
                "INSERT INTO items (restaurant_id, name, description, price, category, image) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ITEM_COLUMNS}"
            )
        } else {
            format!(
                "UPDATE items SET restaurant_id = $1, name = $2, description = $3, price = $4, \
                 category = $5, image = $6 WHERE id = $7 RETURNING {ITEM_COLUMNS}"
            )
        };

        let mut statement = sqlx::query_as::<_, ItemEntity>(&query)
            .bind(item.restaurant_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price)
            .bind(&item.category)
            .bind(&item.image);
        if item.id != 0 {
            statement = statement.bind(item.id);
        }

        Ok(statement.fetch_one(&*self.db).await?)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<UserEntity>> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }

    async fn exists_by_id(&self, id: i64) -> StorageResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&*self.db)
            .await?;
        Ok(exists)
    }

    async fn exists_by_username(&self, username: &str) -> StorageResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&*self.db)
                .await?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> StorageResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&*self.db)
            .await?;
        Ok(exists)
    }

    async fn save(&self, user: UserEntity) -> StorageResult<UserEntity> {
        let saved = if user.id == 0 {
            sqlx::query_as::<_, UserEntity>(
                "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id, username, email",
            )
            .bind(&user.username)
            .bind(&user.email)
            .fetch_one(&*self.db)
            .await?
        } else {
            sqlx::query_as::<_, UserEntity>(
                "UPDATE users SET username = $1, email = $2 WHERE id = $3 \
                 RETURNING id, username, email",
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.id)
            .fetch_one(&*self.db)
            .await?
        };
        Ok(saved)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<OrderEntity>> {
        let order = sqlx::query_as::<_, OrderEntity>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;

        match order {
            Some(order) => Ok(self.attach_lines(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_buyer_id(&self, buyer_id: i64) -> StorageResult<Vec<OrderEntity>> {
        let orders = sqlx::query_as::<_, OrderEntity>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 ORDER BY id"
        ))
        .bind(buyer_id)
        .fetch_all(&*self.db)
        .await?;
        self.attach_lines(orders).await
    }

    async fn find_by_restaurant_id(&self, restaurant_id: i64) -> StorageResult<Vec<OrderEntity>> {
        let orders = sqlx::query_as::<_, OrderEntity>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1 ORDER BY id"
        ))
        .bind(restaurant_id)
        .fetch_all(&*self.db)
        .await?;
        self.attach_lines(orders).await
    }

    async fn save_new(&self, order: NewOrder) -> StorageResult<OrderEntity> {
        // 订单与订单行在同一个事务中写入，任何一步失败都会回滚
        let mut tx = self.db.begin().await?;

        let mut saved = sqlx::query_as::<_, OrderEntity>(&format!(
            "INSERT INTO orders (buyer_id, restaurant_id, table_number, guest_name, total, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.buyer_id)
        .bind(order.restaurant_id)
        .bind(order.table_number)
        .bind(&order.guest_name)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await?;

        for line in &order.lines {
            let saved_line = sqlx::query_as::<_, OrderLineEntity>(&format!(
                "INSERT INTO order_items (order_id, item_id, name, price, quantity) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING {LINE_COLUMNS}"
            ))
            .bind(saved.id)
            .bind(line.item_id)
            .bind(&line.name)
            .bind(line.price)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            saved.lines.push(saved_line);
        }

        tx.commit().await?;
        tracing::info!("Created order {} with {} lines", saved.id, saved.lines.len());
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn count_lines_by_item_id(&self, item_id: i64) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE item_id = $1")
            .bind(item_id)
            .fetch_one(&*self.db)
            .await?;
        Ok(count)
    }
}
