use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

mod handlers;
pub mod service;
pub mod types;

pub use service::ItemService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", post(handlers::create_item))
        .route(
            "/items/{id}",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        // 与餐厅路由共用 {id} 参数名
        .route("/restaurants/{id}/items", get(handlers::list_by_restaurant))
}
