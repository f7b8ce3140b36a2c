// 数据库实体
// 餐厅、菜品、用户与订单

pub mod item;
pub mod order;
pub mod restaurant;
pub mod user;

pub use item::ItemEntity;
pub use order::{NewOrder, NewOrderLine, OrderEntity, OrderLineEntity, OrderStatus};
pub use restaurant::RestaurantEntity;
pub use user::UserEntity;
