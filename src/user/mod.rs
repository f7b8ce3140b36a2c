use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

mod handlers;
pub mod service;
pub mod types;

pub use service::UserService;

// 用户相关的路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::create_user))
        .route("/users/{id}", get(handlers::get_user))
}
