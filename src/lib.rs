use std::sync::Arc;

use chrono::TimeDelta;

use cache::RestaurantCache;
use clock::Clock;
use config::Config;
use database::Repositories;
use item::ItemService;
use middleware::AdmissionGate;
use order::OrderAggregator;
use restaurant::RestaurantService;
use user::UserService;

pub mod cache;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod item;
pub mod middleware;
pub mod order;
pub mod restaurant;
pub mod router;
pub mod user;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gate: Arc<AdmissionGate>,
    pub users: Arc<UserService>,
    pub restaurants: Arc<RestaurantService>,
    pub items: Arc<ItemService>,
    pub orders: Arc<OrderAggregator>,
}

impl AppState {
    /// 组装所有服务，闸门、缓存与聚合器共用同一个时钟
    pub fn new(config: Config, repos: Repositories, clock: Arc<dyn Clock>) -> Self {
        let ttl = TimeDelta::from_std(config.cache_ttl()).unwrap_or_else(|_| {
            tracing::warn!("Cache TTL out of range, falling back to 5 seconds");
            TimeDelta::seconds(5)
        });
        let cache = RestaurantCache::new(repos.restaurants.clone(), clock.clone(), ttl);

        Self {
            gate: Arc::new(AdmissionGate::new(&config, clock.clone())),
            users: Arc::new(UserService::new(repos.clone())),
            restaurants: Arc::new(RestaurantService::new(
                repos.clone(),
                cache,
                config.max_table_count,
            )),
            items: Arc::new(ItemService::new(repos.clone())),
            orders: Arc::new(OrderAggregator::new(repos, clock, &config)),
            config,
        }
    }
}
