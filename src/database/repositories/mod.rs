// 存储库
// 定义核心逻辑依赖的存储接口，以及 Postgres 与内存两种实现

use std::sync::Arc;

use async_trait::async_trait;

use crate::database::entities::{
    ItemEntity, NewOrder, OrderEntity, RestaurantEntity, UserEntity,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// 餐厅存储
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn find_all(&self) -> StorageResult<Vec<RestaurantEntity>>;

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<RestaurantEntity>>;

    /// 返回该店主的第一家餐厅
    async fn find_by_owner_id(&self, owner_id: i64) -> StorageResult<Option<RestaurantEntity>>;

    /// 插入或更新；id 为 0 时插入并返回生成的 id
    async fn save(&self, restaurant: RestaurantEntity) -> StorageResult<RestaurantEntity>;
}

/// 菜品存储
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<ItemEntity>>;

    async fn find_by_restaurant_id(&self, restaurant_id: i64) -> StorageResult<Vec<ItemEntity>>;

    async fn save(&self, item: ItemEntity) -> StorageResult<ItemEntity>;

    async fn delete_by_id(&self, id: i64) -> StorageResult<()>;
}

/// 用户存储
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<UserEntity>>;

    async fn exists_by_id(&self, id: i64) -> StorageResult<bool>;

    async fn exists_by_username(&self, username: &str) -> StorageResult<bool>;

    async fn exists_by_email(&self, email: &str) -> StorageResult<bool>;

    async fn save(&self, user: UserEntity) -> StorageResult<UserEntity>;
}

/// 订单存储
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<OrderEntity>>;

    async fn find_by_buyer_id(&self, buyer_id: i64) -> StorageResult<Vec<OrderEntity>>;

    async fn find_by_restaurant_id(&self, restaurant_id: i64) -> StorageResult<Vec<OrderEntity>>;

    /// 原子地写入订单及其全部订单行
    async fn save_new(&self, order: NewOrder) -> StorageResult<OrderEntity>;

    /// 删除订单及其订单行；订单不存在时什么也不做
    async fn delete_by_id(&self, id: i64) -> StorageResult<()>;

    /// 引用该菜品的订单行数量
    async fn count_lines_by_item_id(&self, item_id: i64) -> StorageResult<i64>;
}

/// 按实体划分的存储句柄，同一个后端可以同时实现全部接口
#[derive(Clone)]
pub struct Repositories {
    pub restaurants: Arc<dyn RestaurantStore>,
    pub items: Arc<dyn ItemStore>,
    pub users: Arc<dyn UserStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RestaurantStore + ItemStore + UserStore + OrderStore + 'static,
    {
        Self {
            restaurants: store.clone(),
            items: store.clone(),
            users: store.clone(),
            orders: store,
        }
    }
}
