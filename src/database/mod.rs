// 数据库模块
// 包含实体定义和存储库实现

pub mod entities; // 数据库实体定义
pub mod repositories; // 存储接口与实现

// 重新导出常用类型，方便其他模块使用
pub use repositories::{MemoryStore, PgStore, Repositories, StorageError};
