/// 缓存操作

// 餐厅读穿缓存
pub mod restaurant;

pub use restaurant::RestaurantCache;
