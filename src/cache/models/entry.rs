use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

/// 一份完整的缓存快照
///
/// 条目从不原地修改，刷新时整体替换，读者只会看到旧值或新值。
#[derive(Debug)]
pub struct CacheEntry<T> {
    value: Arc<T>,
    inserted_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, inserted_at: DateTime<Utc>) -> Self {
        Self {
            value: Arc::new(value),
            inserted_at,
        }
    }

    pub fn value(&self) -> Arc<T> {
        self.value.clone()
    }

    pub fn inserted_at(&self) -> DateTime<Utc> {
        self.inserted_at
    }

    /// 年龄严格小于 ttl 时视为新鲜
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.inserted_at < ttl
    }
}
