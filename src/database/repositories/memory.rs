// 内存存储
// 未配置数据库时使用，同时作为测试替身

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{ItemStore, OrderStore, RestaurantStore, StorageError, StorageResult, UserStore};
use crate::database::entities::{
    ItemEntity, NewOrder, OrderEntity, OrderLineEntity, RestaurantEntity, UserEntity,
};

#[derive(Default)]
struct Tables {
    restaurants: BTreeMap<i64, RestaurantEntity>,
    items: BTreeMap<i64, ItemEntity>,
    users: BTreeMap<i64, UserEntity>,
    orders: BTreeMap<i64, OrderEntity>,
    next_id: i64,
    next_line_id: i64,
}

impl Tables {
    fn assign_id(&mut self, id: i64) -> i64 {
        if id > 0 {
            self.next_id = self.next_id.max(id);
            return id;
        }
        self.next_id += 1;
        self.next_id
    }
}

/// 进程内存储，所有表共用一把读写锁，订单与订单行的写入因此是原子的
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 打开后所有餐厅查询都返回错误，用于验证错误不会被缓存吞掉
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// 当前订单行总数
    pub fn order_line_count(&self) -> usize {
        self.read()
            .map(|tables| tables.orders.values().map(|o| o.lines.len()).sum())
            .unwrap_or(0)
    }

    fn check_reads(&self) -> StorageResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected read failure".into()));
        }
        Ok(())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn find_all(&self) -> StorageResult<Vec<RestaurantEntity>> {
        self.check_reads()?;
        Ok(self.read()?.restaurants.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<RestaurantEntity>> {
        self.check_reads()?;
        Ok(self.read()?.restaurants.get(&id).cloned())
    }

    async fn find_by_owner_id(&self, owner_id: i64) -> StorageResult<Option<RestaurantEntity>> {
        self.check_reads()?;
        Ok(self
            .read()?
            .restaurants
            .values()
            .find(|r| r.owner_id == Some(owner_id))
            .cloned())
    }

    async fn save(&self, mut restaurant: RestaurantEntity) -> StorageResult<RestaurantEntity> {
        let mut tables = self.write()?;
        restaurant.id = tables.assign_id(restaurant.id);
        tables.restaurants.insert(restaurant.id, restaurant.clone());
        Ok(restaurant)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<ItemEntity>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    async fn find_by_restaurant_id(&self, restaurant_id: i64) -> StorageResult<Vec<ItemEntity>> {
        Ok(self
            .read()?
            .items
            .values()
            .filter(|item| item.restaurant_id == Some(restaurant_id))
            .cloned()
            .collect())
    }

    async fn save(&self, mut item: ItemEntity) -> StorageResult<ItemEntity> {
        let mut tables = self.write()?;
        item.id = tables.assign_id(item.id);
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        self.write()?.items.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<UserEntity>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> StorageResult<bool> {
        Ok(self.read()?.users.contains_key(&id))
    }

    async fn exists_by_username(&self, username: &str) -> StorageResult<bool> {
        Ok(self.read()?.users.values().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> StorageResult<bool> {
        Ok(self.read()?.users.values().any(|u| u.email == email))
    }

    async fn save(&self, mut user: UserEntity) -> StorageResult<UserEntity> {
        let mut tables = self.write()?;
        user.id = tables.assign_id(user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<OrderEntity>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn find_by_buyer_id(&self, buyer_id: i64) -> StorageResult<Vec<OrderEntity>> {
        Ok(self
            .read()?
            .orders
            .values()
            .filter(|order| order.buyer_id == Some(buyer_id))
            .cloned()
            .collect())
    }

    async fn find_by_restaurant_id(&self, restaurant_id: i64) -> StorageResult<Vec<OrderEntity>> {
        Ok(self
            .read()?
            .orders
            .values()
            .filter(|order| order.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn save_new(&self, order: NewOrder) -> StorageResult<OrderEntity> {
        let mut tables = self.write()?;
        let order_id = tables.assign_id(0);

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in order.lines {
            tables.next_line_id += 1;
            lines.push(OrderLineEntity {
                id: tables.next_line_id,
                order_id,
                item_id: line.item_id,
                name: line.name,
                price: line.price,
                quantity: line.quantity,
            });
        }

        let saved = OrderEntity {
            id: order_id,
            buyer_id: order.buyer_id,
            restaurant_id: order.restaurant_id,
            table_number: order.table_number,
            guest_name: order.guest_name,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
            lines,
        };
        tables.orders.insert(order_id, saved.clone());
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> StorageResult<()> {
        self.write()?.orders.remove(&id);
        Ok(())
    }

    async fn count_lines_by_item_id(&self, item_id: i64) -> StorageResult<i64> {
        let count = self
            .read()?
            .orders
            .values()
            .flat_map(|order| order.lines.iter())
            .filter(|line| line.item_id == item_id)
            .count();
        Ok(count as i64)
    }
}
