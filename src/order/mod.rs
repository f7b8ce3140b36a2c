use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub mod aggregator;
mod handlers;
pub mod types;

pub use aggregator::{CreateOrderCommand, OrderAggregator, OrderLineRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(handlers::create_order))
        .route(
            "/orders/{id}",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/orders/user/{user_id}", get(handlers::list_by_user))
        .route(
            "/orders/restaurant/{restaurant_id}",
            get(handlers::list_by_restaurant),
        )
}
