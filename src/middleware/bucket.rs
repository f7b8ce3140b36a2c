use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill_at: DateTime<Utc>,
}

/// 单个客户端的令牌桶
///
/// 每经过一个完整窗口，令牌直接补满到 `capacity`，不会逐步滴入，
/// 也不会超过容量。窗口从桶创建（或上次补充）时刻开始计算。
#[derive(Debug)]
pub struct ClientBucket {
    capacity: u32,
    state: Mutex<BucketState>,
}

impl ClientBucket {
    pub fn new(capacity: u32, now: DateTime<Utc>) -> Self {
        Self {
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill_at: now,
            }),
        }
    }

    /// 先按经过的时间补充令牌，再尝试扣减 `permits` 个；整个过程在桶锁内完成
    pub fn try_consume(&self, permits: u32, now: DateTime<Utc>, window: TimeDelta) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.refill(&mut state, now, window);

        if state.tokens >= permits {
            state.tokens -= permits;
            true
        } else {
            false
        }
    }

    /// 当前可用令牌数（已考虑补充）
    pub fn available(&self, now: DateTime<Utc>, window: TimeDelta) -> u32 {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.refill(&mut state, now, window);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState, now: DateTime<Utc>, window: TimeDelta) {
        if window <= TimeDelta::zero() {
            state.tokens = self.capacity;
            state.last_refill_at = now;
            return;
        }

        let elapsed = now - state.last_refill_at;
        if elapsed < window {
            return;
        }

        // 对齐到窗口边界，避免补充时刻随请求漂移
        let windows = elapsed.num_milliseconds() / window.num_milliseconds().max(1);
        state.tokens = self.capacity;
        match i32::try_from(windows) {
            Ok(windows) => state.last_refill_at += window * windows,
            // 空闲时间过长，窗口数放不进 i32，直接从当前时刻重新计窗
            Err(_) => state.last_refill_at = now,
        }
    }
}
