use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::TimeDelta;
use dashmap::DashMap;

use super::bucket::ClientBucket;
use crate::{clock::Clock, config::Config, error::AppError};

/// 端点类别，认证与下单使用更严格的配额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    Auth,
    General,
}

/// 按 API 前缀划分端点类别
#[derive(Debug, Clone)]
pub struct EndpointClassifier {
    auth_prefix: String,
    order_path: String,
}

impl EndpointClassifier {
    pub fn new(api_base_uri: &str) -> Self {
        let base = api_base_uri.trim_end_matches('/');
        Self {
            auth_prefix: format!("{}/auth/", base),
            order_path: format!("{}/orders", base),
        }
    }

    /// 认证路径与下单（恰好是订单集合路径）归为 Auth
    pub fn classify(&self, path: &str) -> EndpointClass {
        let creates_order = path.contains(&self.order_path) && path.ends_with(&self.order_path);
        if path.contains(&self.auth_prefix) || creates_order {
            EndpointClass::Auth
        } else {
            EndpointClass::General
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    client: String,
    class: EndpointClass,
}

/// 请求准入控制
///
/// 桶按 (客户端, 端点类别) 懒创建并存活到进程结束，不做回收。
pub struct AdmissionGate {
    enabled: bool,
    general_limit: u32,
    auth_limit: u32,
    window: TimeDelta,
    classifier: EndpointClassifier,
    buckets: DashMap<BucketKey, Arc<ClientBucket>>,
    clock: Arc<dyn Clock>,
}

impl AdmissionGate {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let window = TimeDelta::from_std(config.rate_limit_window())
            .ok()
            .filter(|window| *window > TimeDelta::zero())
            .unwrap_or_else(|| {
                tracing::warn!("Rate limit window out of range, falling back to one minute");
                TimeDelta::minutes(1)
            });

        Self {
            enabled: config.rate_limit_enabled,
            general_limit: config.general_limit_per_minute,
            auth_limit: config.auth_limit_per_minute,
            window,
            classifier: EndpointClassifier::new(&config.api_base_uri),
            buckets: DashMap::new(),
            clock,
        }
    }

    pub fn limit_for(&self, class: EndpointClass) -> u32 {
        match class {
            EndpointClass::Auth => self.auth_limit,
            EndpointClass::General => self.general_limit,
        }
    }

    /// 对一次请求做出准入决定，每个请求只调用一次
    pub fn admit(&self, client_key: &str, class: EndpointClass) -> Admission {
        if !self.enabled {
            return Admission::Allow;
        }

        let now = self.clock.now();
        let key = BucketKey {
            client: client_key.to_string(),
            class,
        };
        // entry 在分片锁内完成查找或插入，同一个键并发首访只会建一个桶
        let bucket = self
            .buckets
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!("Creating {:?} bucket for {}", class, client_key);
                Arc::new(ClientBucket::new(self.limit_for(class), now))
            })
            .clone();

        if bucket.try_consume(1, now, self.window) {
            Admission::Allow
        } else {
            Admission::Deny
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());
        let client = client_key(req.headers(), remote_ip.as_deref());
        let class = self.classifier.classify(req.uri().path());

        match self.admit(&client, class) {
            Admission::Allow => next.run(req).await,
            Admission::Deny => {
                tracing::warn!(
                    "Rate limit exceeded for {} on {} ({:?})",
                    client,
                    req.uri().path(),
                    class
                );
                AppError::RateLimited.into_response()
            }
        }
    }
}

/// X-Forwarded-For 的第一项，否则使用连接地址
pub fn client_key(headers: &HeaderMap, remote_ip: Option<&str>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or(remote_ip)
        .unwrap_or("unknown")
        .to_string()
}

pub async fn rate_limit(
    State(gate): State<Arc<AdmissionGate>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    gate.check_rate_limit(req, next).await
}
