use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::TimeDelta;
use menuq_backend::{
    AppState,
    clock::ManualClock,
    config::Config,
    database::{
        MemoryStore, Repositories,
        entities::{ItemEntity, RestaurantEntity, UserEntity},
        repositories::{ItemStore, OrderStore, RestaurantStore, UserStore},
    },
    router::create_router,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    router: Router,
}

fn app_with(config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::default());
    let state = AppState::new(config, Repositories::from_store(store.clone()), clock.clone());
    TestApp {
        store,
        clock,
        router: create_router(state),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn seed_user(store: &MemoryStore, username: &str) -> UserEntity {
    UserStore::save(
        store,
        UserEntity {
            id: 0,
            username: username.into(),
            email: format!("{}@example.com", username),
        },
    )
    .await
    .unwrap()
}

/// 一家 5 桌的餐厅和一道 10.00 的菜
async fn seed_menu(store: &MemoryStore) -> (RestaurantEntity, ItemEntity) {
    let owner = seed_user(store, "owner").await;
    let restaurant = RestaurantStore::save(
        store,
        RestaurantEntity {
            id: 0,
            name: "Casa".into(),
            owner_id: Some(owner.id),
            table_count: 5,
            cover: None,
            description: Some("Comida caseira".into()),
        },
    )
    .await
    .unwrap();
    let item = ItemStore::save(
        store,
        ItemEntity {
            id: 0,
            restaurant_id: Some(restaurant.id),
            name: "Feijoada".into(),
            description: None,
            price: Decimal::new(1000, 2),
            category: None,
            image: None,
        },
    )
    .await
    .unwrap();
    (restaurant, item)
}

#[tokio::test]
async fn general_requests_over_limit_get_429() {
    let app = app_with(Config {
        general_limit_per_minute: 2,
        ..Config::default()
    });

    for _ in 0..2 {
        let (status, _) = send(&app.router, get("/api/restaurants")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app.router, get("/api/restaurants")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({ "error": "Too many requests. Please try again later." })
    );

    // 整个窗口过去后恢复
    app.clock.advance(TimeDelta::seconds(60));
    let (status, _) = send(&app.router, get("/api/restaurants")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn forwarded_clients_are_limited_separately() {
    let app = app_with(Config {
        general_limit_per_minute: 1,
        ..Config::default()
    });
    let from = |ip: &str| {
        Request::builder()
            .uri("/api/restaurants")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(send(&app.router, from("203.0.113.1")).await.0, StatusCode::OK);
    assert_eq!(send(&app.router, from("203.0.113.2")).await.0, StatusCode::OK);
    assert_eq!(
        send(&app.router, from("203.0.113.1")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn disabled_gate_never_rejects() {
    let app = app_with(Config {
        rate_limit_enabled: false,
        general_limit_per_minute: 1,
        ..Config::default()
    });
    for _ in 0..5 {
        let (status, _) = send(&app.router, get("/api/restaurants")).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn create_order_prices_lines_and_returns_pending() {
    let app = app_with(Config::default());
    let (restaurant, item) = seed_menu(&app.store).await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/orders",
            json!({
                "restaurantId": restaurant.id,
                "tableNumber": 3,
                "guestName": "Ana",
                "items": [{ "itemId": item.id, "quantity": 2 }, { "itemId": item.id, "quantity": 1 }],
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let order = &body["order"];
    assert_eq!(order["total"], "30.00");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["tableNumber"], 3);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["items"][0]["name"], "Feijoada");

    let id = order["id"].as_i64().unwrap();
    let (status, fetched) = send(&app.router, get(&format!("/api/orders/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["total"], "30.00");
}

#[tokio::test]
async fn create_order_rejects_bad_table_without_saving() {
    let app = app_with(Config::default());
    let (restaurant, item) = seed_menu(&app.store).await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/orders",
            json!({
                "restaurantId": restaurant.id,
                "tableNumber": 6,
                "items": [{ "itemId": item.id, "quantity": 1 }],
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid table number. Must be between 1 and 5");
    assert_eq!(app.store.order_line_count(), 0);
}

#[tokio::test]
async fn create_order_missing_restaurant_is_bad_request() {
    let app = app_with(Config::default());
    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/orders", json!({ "items": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_order_is_404_and_delete_removes() {
    let app = app_with(Config::default());
    let (restaurant, item) = seed_menu(&app.store).await;

    let (status, _) = send(&app.router, get("/api/orders/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/orders",
            json!({
                "restaurantId": restaurant.id,
                "items": [{ "itemId": item.id, "quantity": 1 }],
            }),
        ),
    )
    .await;
    let id = body["order"]["id"].as_i64().unwrap();

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/orders/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order removed");

    let (status, _) = send(&app.router, get(&format!("/api/orders/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_sees_own_update_immediately() {
    let app = app_with(Config::default());
    let owner = seed_user(&app.store, "maria").await;

    let (status, created) = send(
        &app.router,
        json_request(
            "POST",
            "/api/restaurants",
            json!({ "ownerId": owner.id, "name": "Old name" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["tableCount"], 10);

    let owner_uri = format!("/api/restaurants/owner/{}", owner.id);
    let (_, seen) = send(&app.router, get(&owner_uri)).await;
    assert_eq!(seen["name"], "Old name");

    let id = created["id"].as_i64().unwrap();
    let (status, _) = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/restaurants/{}", id),
            json!({ "name": "New name" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, seen) = send(&app.router, get(&owner_uri)).await;
    assert_eq!(seen["name"], "New name");

    let (_, listing) = send(&app.router, get("/api/restaurants")).await;
    assert_eq!(listing[0]["name"], "New name");
}

#[tokio::test]
async fn second_restaurant_for_owner_conflicts() {
    let app = app_with(Config::default());
    let owner = seed_user(&app.store, "maria").await;
    let body = json!({ "ownerId": owner.id, "name": "Casa" });

    let (status, _) = send(
        &app.router,
        json_request("POST", "/api/restaurants", body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app.router, json_request("POST", "/api/restaurants", body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn public_menu_lists_items_for_valid_table() {
    let app = app_with(Config::default());
    let (restaurant, _) = seed_menu(&app.store).await;

    let (status, menu) = send(
        &app.router,
        get(&format!("/api/public/menu/{}/table/2", restaurant.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(menu["restaurant"]["name"], "Casa");
    assert_eq!(menu["restaurant"]["cover"], "");
    assert_eq!(menu["tableNumber"], 2);
    assert_eq!(menu["items"][0]["price"], "10.00");

    let (status, _) = send(
        &app.router,
        get(&format!("/api/public/menu/{}/table/9", restaurant.id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn root_base_uri_serves_routes_without_prefix() {
    let app = app_with(Config {
        api_base_uri: "/".into(),
        ..Config::default()
    });
    let (status, body) = send(&app.router, get("/restaurants")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

fn order_body(restaurant_id: i64, item_id: i64) -> Value {
    json!({
        "restaurantId": restaurant_id,
        "tableNumber": 1,
        "items": [{ "itemId": item_id, "quantity": 1 }],
    })
}

#[tokio::test]
async fn sixth_order_in_a_minute_is_rejected_and_not_saved() {
    let app = app_with(Config::default());
    let (restaurant, item) = seed_menu(&app.store).await;

    for _ in 0..5 {
        let (status, _) = send(
            &app.router,
            json_request("POST", "/api/orders", order_body(restaurant.id, item.id)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/orders", order_body(restaurant.id, item.id)),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({ "error": "Too many requests. Please try again later." })
    );

    let saved = OrderStore::find_by_restaurant_id(&*app.store, restaurant.id)
        .await
        .unwrap();
    assert_eq!(saved.len(), 5);

    // 下单额度不影响普通读请求
    let (status, _) = send(&app.router, get("/api/restaurants")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn order_creation_limit_follows_custom_base_uri() {
    let app = app_with(Config {
        api_base_uri: "/v1".into(),
        auth_limit_per_minute: 1,
        ..Config::default()
    });
    let (restaurant, item) = seed_menu(&app.store).await;

    let (status, _) = send(
        &app.router,
        json_request("POST", "/v1/orders", order_body(restaurant.id, item.id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(
        &app.router,
        json_request("POST", "/v1/orders", order_body(restaurant.id, item.id)),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn menu_can_be_built_and_ordered_over_http() {
    let app = app_with(Config::default());

    let (status, owner) = send(
        &app.router,
        json_request(
            "POST",
            "/api/users",
            json!({ "username": "maria", "email": "maria@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let owner_id = owner["id"].as_i64().unwrap();

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            "/api/users",
            json!({ "username": "other", "email": "maria@example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, restaurant) = send(
        &app.router,
        json_request(
            "POST",
            "/api/restaurants",
            json!({ "ownerId": owner_id, "name": "Casa", "tableCount": 4 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let restaurant_id = restaurant["id"].as_i64().unwrap();

    let (status, item) = send(
        &app.router,
        json_request(
            "POST",
            "/api/items",
            json!({
                "userId": owner_id,
                "restaurantId": restaurant_id,
                "name": "Moqueca",
                "price": "12.50",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["price"], "12.50");
    let item_id = item["id"].as_i64().unwrap();

    let (status, items) = send(
        &app.router,
        get(&format!("/api/restaurants/{}/items", restaurant_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items[0]["name"], "Moqueca");

    let (status, body) = send(
        &app.router,
        json_request("POST", "/api/orders", order_body(restaurant_id, item_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["total"], "12.50");

    // 被订单引用的菜品不能删除
    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/items/{}?userId={}", item_id, owner_id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn item_writes_require_restaurant_owner() {
    let app = app_with(Config::default());
    let (restaurant, item) = seed_menu(&app.store).await;
    let stranger = seed_user(&app.store, "stranger").await;

    let (status, body) = send(
        &app.router,
        json_request(
            "POST",
            "/api/items",
            json!({
                "userId": stranger.id,
                "restaurantId": restaurant.id,
                "name": "Intruso",
                "price": "1.00",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User does not own this restaurant");

    let (status, _) = send(
        &app.router,
        json_request(
            "POST",
            "/api/items",
            json!({
                "userId": restaurant.owner_id,
                "restaurantId": restaurant.id,
                "name": "Gratis",
                "price": "0",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/items/{}?userId={}", item.id, stranger.id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, delete).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, fetched) = send(&app.router, get(&format!("/api/items/{}", item.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Feijoada");
}
