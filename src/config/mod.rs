use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// 未配置时使用进程内存储
    pub database_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_enabled: bool,
    pub general_limit_per_minute: u32,
    pub auth_limit_per_minute: u32,
    pub rate_limit_window_secs: u64,
    pub cache_ttl_millis: u64,
    pub max_items_per_order: usize,
    pub max_quantity_per_item: i32,
    pub max_table_count: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            api_base_uri: "/api".to_string(),
            rate_limit_enabled: true,
            general_limit_per_minute: 60,
            auth_limit_per_minute: 5,
            rate_limit_window_secs: 60,
            cache_ttl_millis: 5000,
            max_items_per_order: 100,
            max_quantity_per_item: 50,
            max_table_count: 50,
        }
    }
}

/// 读取环境变量并解析，缺失或格式错误时回退到默认值
fn var_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

/// 窗口为 0 会让每个请求都补满令牌，等于关闭限流
fn non_zero_window(secs: u64, default: u64) -> u64 {
    if secs == 0 {
        tracing::warn!("RATE_LIMIT_WINDOW must be positive, using {}s", default);
        default
    } else {
        secs
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Config::default();
        Config {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: var_or("SERVER_PORT", defaults.server_port),
            api_base_uri: env::var("API_BASE_URI").unwrap_or(defaults.api_base_uri),
            rate_limit_enabled: var_or("RATE_LIMIT_ENABLED", defaults.rate_limit_enabled),
            general_limit_per_minute: var_or(
                "RATE_LIMIT_GENERAL",
                defaults.general_limit_per_minute,
            ),
            auth_limit_per_minute: var_or("RATE_LIMIT_AUTH", defaults.auth_limit_per_minute),
            rate_limit_window_secs: non_zero_window(
                var_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window_secs),
                defaults.rate_limit_window_secs,
            ),
            cache_ttl_millis: var_or("CACHE_TTL_MS", defaults.cache_ttl_millis),
            max_items_per_order: var_or("MAX_ITEMS_PER_ORDER", defaults.max_items_per_order),
            max_quantity_per_item: var_or("MAX_QUANTITY_PER_ITEM", defaults.max_quantity_per_item),
            max_table_count: var_or("MAX_TABLE_COUNT", defaults.max_table_count),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_millis)
    }
}
