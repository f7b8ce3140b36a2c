// 缓存模块
// 包含缓存数据结构和操作逻辑

pub mod models;
pub mod operations;

// 重新导出常用类型，方便其他模块使用
pub use models::CacheEntry;
pub use operations::RestaurantCache;
