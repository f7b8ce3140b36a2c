use std::sync::{Arc, RwLock, RwLockWriteGuard};

use chrono::TimeDelta;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::cache::models::CacheEntry;
use crate::clock::Clock;
use crate::database::entities::RestaurantEntity;
use crate::database::repositories::RestaurantStore;
use crate::error::{AppError, AppResult};

type Listing = Vec<RestaurantEntity>;

#[derive(Default)]
struct ListingSlot {
    /// 每次写入加一；刷新开始后若发生变化，刷新结果作废
    epoch: u64,
    entry: Option<Arc<CacheEntry<Listing>>>,
}

/// 餐厅读穿缓存
///
/// 全量列表与按店主查询各自独立过期，最多陈旧 ttl。写入时列表立即失效，
/// 被修改店主的条目直接写入新值，保证该店主读到自己刚写的数据。
/// 其他店主的条目不受影响。
///
/// 刷新结果以刷新开始的时刻为时间戳，写回时不会覆盖在那之后写入的条目。
pub struct RestaurantCache {
    store: Arc<dyn RestaurantStore>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    listing: RwLock<ListingSlot>,
    by_owner: DashMap<i64, Arc<CacheEntry<RestaurantEntity>>>,
}

impl RestaurantCache {
    pub fn new(store: Arc<dyn RestaurantStore>, clock: Arc<dyn Clock>, ttl: TimeDelta) -> Self {
        Self {
            store,
            clock,
            ttl,
            listing: RwLock::new(ListingSlot::default()),
            by_owner: DashMap::new(),
        }
    }

    /// 全量餐厅列表；过期或不存在时从存储刷新，存储错误原样向上传递
    pub async fn get_all(&self) -> AppResult<Arc<Listing>> {
        let now = self.clock.now();
        let (cached, epoch) = self.current_listing();
        if let Some(entry) = cached {
            if entry.is_fresh(now, self.ttl) {
                tracing::debug!("Restaurant listing served from cache");
                return Ok(entry.value());
            }
        }

        // 并发的过期读可能各自刷新一次，较新的快照生效
        let fresh = self.store.find_all().await?;
        tracing::debug!("Refreshed restaurant listing ({} entries)", fresh.len());
        let entry = Arc::new(CacheEntry::new(fresh, now));
        let value = entry.value();

        let mut slot = self.write_listing();
        if slot.epoch != epoch {
            tracing::debug!("Discarding listing refresh that started before a write");
            return Ok(value);
        }
        let newer_cached = slot
            .entry
            .as_ref()
            .is_some_and(|cached| cached.inserted_at() > now);
        if !newer_cached {
            slot.entry = Some(entry);
        }
        Ok(value)
    }

    pub async fn get_by_owner(&self, owner_id: i64) -> AppResult<RestaurantEntity> {
        let now = self.clock.now();
        // 先克隆出 Arc 再释放分片锁
        let cached = self.by_owner.get(&owner_id).map(|entry| entry.value().clone());
        if let Some(entry) = cached {
            if entry.is_fresh(now, self.ttl) {
                tracing::debug!("Restaurant for owner {} served from cache", owner_id);
                return Ok(entry.value().as_ref().clone());
            }
        }

        let fresh = self
            .store
            .find_by_owner_id(owner_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Restaurant not found for owner: {}", owner_id))
            })?;

        match self.by_owner.entry(owner_id) {
            Entry::Occupied(mut occupied) => {
                // 刷新期间写入的条目比本次读到的数据新
                if occupied.get().inserted_at() >= now {
                    tracing::debug!("Keeping newer cache entry for owner {}", owner_id);
                    return Ok(occupied.get().value().as_ref().clone());
                }
                occupied.insert(Arc::new(CacheEntry::new(fresh.clone(), now)));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(CacheEntry::new(fresh.clone(), now)));
            }
        }
        Ok(fresh)
    }

    /// 餐厅创建或更新后、返回调用方之前调用
    pub fn write_through(&self, saved: &RestaurantEntity) {
        {
            let mut slot = self.write_listing();
            slot.epoch += 1;
            slot.entry = None;
        }
        if let Some(owner_id) = saved.owner_id {
            let entry = CacheEntry::new(saved.clone(), self.clock.now());
            self.by_owner.insert(owner_id, Arc::new(entry));
            tracing::debug!("Cache write-through for owner {}", owner_id);
        }
    }

    fn current_listing(&self) -> (Option<Arc<CacheEntry<Listing>>>, u64) {
        let slot = self
            .listing
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (slot.entry.clone(), slot.epoch)
    }

    fn write_listing(&self) -> RwLockWriteGuard<'_, ListingSlot> {
        self.listing
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::MemoryStore;
    use crate::database::repositories::StorageResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        cache: RestaurantCache,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let cache = RestaurantCache::new(
            store.clone(),
            clock.clone(),
            TimeDelta::milliseconds(5000),
        );
        Fixture {
            store,
            clock,
            cache,
        }
    }

    fn restaurant(owner_id: i64, name: &str) -> RestaurantEntity {
        RestaurantEntity {
            id: 0,
            name: name.to_string(),
            owner_id: Some(owner_id),
            table_count: 10,
            cover: None,
            description: None,
        }
    }

    async fn put(store: &MemoryStore, restaurant: RestaurantEntity) -> RestaurantEntity {
        RestaurantStore::save(store, restaurant).await.unwrap()
    }

    #[tokio::test]
    async fn listing_is_reused_within_ttl_and_refreshed_after() {
        let f = fixture();
        put(&f.store, restaurant(1, "A")).await;

        let first = f.cache.get_all().await.unwrap();
        put(&f.store, restaurant(2, "B")).await;
        f.clock.advance(TimeDelta::milliseconds(4000));
        let second = f.cache.get_all().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        f.clock.advance(TimeDelta::milliseconds(1000));
        let third = f.cache.get_all().await.unwrap();
        assert_eq!(third.len(), 2);
    }

    #[tokio::test]
    async fn owner_lookup_missing_is_not_found() {
        let f = fixture();
        let err = f.cache.get_by_owner(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn write_through_gives_read_your_own_write_for_that_owner() {
        let f = fixture();
        let saved = put(&f.store, restaurant(1, "Old")).await;
        assert_eq!(f.cache.get_by_owner(1).await.unwrap().name, "Old");

        let mut updated = saved.clone();
        updated.name = "New".into();
        let updated = put(&f.store, updated).await;
        f.cache.write_through(&updated);

        assert_eq!(f.cache.get_by_owner(1).await.unwrap().name, "New");
    }

    #[tokio::test]
    async fn other_owners_may_stay_stale_until_ttl() {
        let f = fixture();
        let other = put(&f.store, restaurant(2, "Before")).await;
        f.cache.get_by_owner(2).await.unwrap();

        // 绕过缓存直接改存储，模拟其他实例的写入
        let mut changed = other.clone();
        changed.name = "After".into();
        put(&f.store, changed).await;
        f.cache.write_through(&restaurant(1, "Unrelated"));

        assert_eq!(f.cache.get_by_owner(2).await.unwrap().name, "Before");
        f.clock.advance(TimeDelta::milliseconds(5000));
        assert_eq!(f.cache.get_by_owner(2).await.unwrap().name, "After");
    }

    #[tokio::test]
    async fn write_through_forces_next_listing_refresh() {
        let f = fixture();
        f.cache.get_all().await.unwrap();
        let saved = put(&f.store, restaurant(1, "A")).await;
        f.cache.write_through(&saved);

        let listing = f.cache.get_all().await.unwrap();
        assert_eq!(listing.len(), 1);
    }

    #[tokio::test]
    async fn storage_failures_propagate_instead_of_serving_stale() {
        let f = fixture();
        put(&f.store, restaurant(1, "A")).await;
        f.cache.get_all().await.unwrap();

        f.store.fail_reads(true);
        f.clock.advance(TimeDelta::milliseconds(6000));
        assert!(matches!(f.cache.get_all().await, Err(AppError::Storage(_))));
        assert!(matches!(f.cache.get_by_owner(9).await, Err(AppError::Storage(_))));
    }

    /// 读到数据后停在 `resume` 上，模拟慢查询
    #[derive(Default)]
    struct PausingStore {
        inner: MemoryStore,
        paused: AtomicBool,
        reached: Notify,
        resume: Notify,
    }

    impl PausingStore {
        async fn pause_point(&self) {
            if self.paused.load(Ordering::SeqCst) {
                self.reached.notify_one();
                self.resume.notified().await;
            }
        }

        fn release(&self) {
            self.paused.store(false, Ordering::SeqCst);
            self.resume.notify_one();
        }
    }

    #[async_trait]
    impl RestaurantStore for PausingStore {
        async fn find_all(&self) -> StorageResult<Vec<RestaurantEntity>> {
            let result = self.inner.find_all().await;
            self.pause_point().await;
            result
        }

        async fn find_by_id(&self, id: i64) -> StorageResult<Option<RestaurantEntity>> {
            RestaurantStore::find_by_id(&self.inner, id).await
        }

        async fn find_by_owner_id(&self, owner_id: i64) -> StorageResult<Option<RestaurantEntity>> {
            let result = self.inner.find_by_owner_id(owner_id).await;
            self.pause_point().await;
            result
        }

        async fn save(&self, restaurant: RestaurantEntity) -> StorageResult<RestaurantEntity> {
            RestaurantStore::save(&self.inner, restaurant).await
        }
    }

    fn pausing_cache() -> (Arc<PausingStore>, Arc<RestaurantCache>) {
        let store = Arc::new(PausingStore::default());
        let cache = RestaurantCache::new(
            store.clone(),
            Arc::new(ManualClock::default()),
            TimeDelta::milliseconds(5000),
        );
        (store, Arc::new(cache))
    }

    #[tokio::test]
    async fn slow_owner_refresh_does_not_undo_write_through() {
        let (store, cache) = pausing_cache();
        let saved = put(&store.inner, restaurant(1, "Old")).await;

        store.paused.store(true, Ordering::SeqCst);
        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_by_owner(1).await })
        };
        store.reached.notified().await;

        let mut renamed = saved.clone();
        renamed.name = "New".into();
        let renamed = put(&store.inner, renamed).await;
        cache.write_through(&renamed);

        store.release();
        reader.await.unwrap().unwrap();

        assert_eq!(cache.get_by_owner(1).await.unwrap().name, "New");
    }

    #[tokio::test]
    async fn slow_listing_refresh_does_not_restore_cleared_listing() {
        let (store, cache) = pausing_cache();
        put(&store.inner, restaurant(1, "A")).await;

        store.paused.store(true, Ordering::SeqCst);
        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_all().await })
        };
        store.reached.notified().await;

        let added = put(&store.inner, restaurant(2, "B")).await;
        cache.write_through(&added);

        store.release();
        assert_eq!(reader.await.unwrap().unwrap().len(), 1);

        assert_eq!(cache.get_all().await.unwrap().len(), 2);
    }
}
