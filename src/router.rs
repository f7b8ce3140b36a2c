use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};
use tower::ServiceBuilder;

use crate::{
    AppState, item,
    middleware::{log_errors, rate_limit},
    order, restaurant, user,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(user::router())
        .merge(restaurant::router())
        .merge(item::router())
        .merge(order::router())
}

// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let base = state.config.api_base_uri.trim_end_matches('/');
    // nest 不接受根路径
    let router = if base.is_empty() {
        Router::new().merge(api_routes())
    } else {
        Router::new().nest(base, api_routes())
    };

    // 限流在最外层，被拒绝的请求不会进入日志和处理器
    let router = router.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(state.gate.clone(), rate_limit))
            .layer(from_fn(log_errors)),
    );

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
