use axum::{
    Router,
    routing::get,
};

use crate::AppState;

mod handlers;
pub mod service;
pub mod types;

pub use service::RestaurantService;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/restaurants",
            get(handlers::list_restaurants).post(handlers::create_restaurant),
        )
        .route(
            "/restaurants/{id}",
            get(handlers::get_restaurant).put(handlers::update_restaurant),
        )
        .route("/restaurants/owner/{owner_id}", get(handlers::get_by_owner))
        // 扫码进入，无需登录
        .route(
            "/public/menu/{restaurant_id}/table/{table_number}",
            get(handlers::public_menu),
        )
}
