use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use chrono::{Duration, Utc};
use serde_json::json;
use vault_common::UsdRate;
use vault_engine::{
    db_types::{Order, OrderId, OrderStatusType, ProductId},
    events::EventProducers,
    market_api::exchange_objects::ExchangeRate,
    traits::{ExchangeRateError, MarketplaceError, ReleasedOrder},
    AccountApi,
    OrderFlowApi,
    ReservationApi,
};

use super::{
    helpers::*,
    mocks::{MockAccountManager, MockOrderStore},
};
use crate::routes::{
    CancelOrderRoute,
    ConfirmPaymentRoute,
    ExpiredOrdersRoute,
    MyCredentialsRoute,
    ReleaseOrderRoute,
    ReserveRoute,
    SearchOrdersRoute,
    UpdateOrderStatusRoute,
};

//------------------------------------------------   Reservations  ---------------------------------------------------

#[actix_web::test]
async fn reserve_product() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_product().returning(|id| Ok(Some(product(id.value(), 3))));
        store
            .expect_fetch_last_rate()
            .returning(|c| Ok(ExchangeRate::new(c.to_string(), UsdRate::from_dollars(50_000), None)));
        store.expect_fetch_active_addresses().returning(|| Ok(vec![]));
        store.expect_insert_reservation().times(1).returning(|o| {
            let mut order = order(11, o.user_id.as_str(), OrderStatusType::AwaitingPayment, o.created_at);
            order.amount_crypto = o.amount_crypto;
            order.currency = o.currency;
            Ok(order)
        });
        reservation_routes(cfg, store);
    };
    let body = json!({ "product_id": 1, "currency": "btc" });
    let (status, body) = post_request(&buyer_token("alice"), "/reservations", body, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.user_id.as_str(), "alice");
    assert_eq!(order.currency, "BTC");
    assert_eq!(order.amount_crypto.to_string(), "0.00100000");
    assert_eq!(order.status, OrderStatusType::AwaitingPayment);
}

#[actix_web::test]
async fn reserve_without_rate() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_product().returning(|id| Ok(Some(product(id.value(), 3))));
        store.expect_fetch_last_rate().returning(|c| Err(ExchangeRateError::RateDoesNotExist(c.to_string())));
        store.expect_insert_reservation().never();
        reservation_routes(cfg, store);
    };
    let body = json!({ "product_id": 1, "currency": "XMR" });
    let (status, body) = post_request(&buyer_token("alice"), "/reservations", body, configure).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"No exchange rate is available for XMR"}"#);
}

#[actix_web::test]
async fn reserve_sold_out_product() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_product().returning(|id| Ok(Some(product(id.value(), 0))));
        store.expect_insert_reservation().never();
        reservation_routes(cfg, store);
    };
    let body = json!({ "product_id": 4, "currency": "BTC" });
    let (status, _) = post_request(&buyer_token("alice"), "/reservations", body, configure).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

//------------------------------------------------   Order flow  ---------------------------------------------------

#[actix_web::test]
async fn confirm_payment() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), "alice", OrderStatusType::AwaitingPayment, Utc::now()))));
        store
            .expect_transition_order()
            .withf(|_, from, to, actor| {
                *from == OrderStatusType::AwaitingPayment && *to == OrderStatusType::Paid && !actor.is_operator()
            })
            .times(1)
            .returning(|id, _, to, _| Ok(order(id.value(), "alice", to, Utc::now())));
        flow_routes(cfg, store);
    };
    let (status, body) = post_request(&buyer_token("alice"), "/orders/5/confirm_payment", json!({}), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.id, OrderId(5));
    assert_eq!(order.status, OrderStatusType::Paid);
}

#[actix_web::test]
async fn late_payment_confirmation() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        let placed = Utc::now() - Duration::minutes(16);
        store
            .expect_fetch_order()
            .returning(move |id| Ok(Some(order(id.value(), "alice", OrderStatusType::AwaitingPayment, placed))));
        store.expect_transition_order().never();
        flow_routes(cfg, store);
    };
    let (status, body) = post_request(&buyer_token("alice"), "/orders/5/confirm_payment", json!({}), configure).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body, r#"{"error":"The reservation window for order #5 has closed. Please start checkout again"}"#);
}

#[actix_web::test]
async fn other_buyers_orders_are_invisible() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), "alice", OrderStatusType::AwaitingPayment, Utc::now()))));
        store.expect_transition_order().never();
        flow_routes(cfg, store);
    };
    let (status, body) = post_request(&buyer_token("mallory"), "/orders/5/cancel", json!({}), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order #5 does not exist"}"#);
}

#[actix_web::test]
async fn released_orders_are_final() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), "alice", OrderStatusType::Released, Utc::now()))));
        store.expect_transition_order().never();
        store.expect_allocate_credential().never();
        flow_routes(cfg, store);
    };
    let token = operator_token();
    let (status, body) =
        send_request(Method::PATCH, &token, "/orders/5/status", Some(json!({ "status": "paid" })), configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"An order cannot move from released to paid"}"#);
}

#[actix_web::test]
async fn release_order() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), "alice", OrderStatusType::Verified, Utc::now()))));
        store.expect_allocate_credential().times(1).returning(|id, _| {
            let order = order(id.value(), "alice", OrderStatusType::Released, Utc::now());
            Ok(ReleasedOrder::new(order, released_credential(3, id.value())))
        });
        flow_routes(cfg, store);
    };
    let (status, body) = post_request(&operator_token(), "/orders/5/release", json!({}), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let released: ReleasedOrder = serde_json::from_str(&body).unwrap();
    assert_eq!(released.order.status, OrderStatusType::Released);
    assert_eq!(released.credential.assigned_order_id, Some(OrderId(5)));
}

#[actix_web::test]
async fn release_with_empty_pool() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), "alice", OrderStatusType::Paid, Utc::now()))));
        store
            .expect_allocate_credential()
            .returning(|_, _| Err(MarketplaceError::NoCredentialAvailable(ProductId(1))));
        flow_routes(cfg, store);
    };
    let (status, body) = post_request(&operator_token(), "/orders/5/release", json!({}), configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"There are no credentials available for product #1"}"#);
}

#[actix_web::test]
async fn buyers_cannot_release() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| flow_routes(cfg, MockOrderStore::new());
    let (status, _) = post_request(&buyer_token("alice"), "/orders/5/release", json!({}), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

//------------------------------------------------   Queries  ---------------------------------------------------

#[actix_web::test]
async fn my_credentials() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut accounts = MockAccountManager::new();
        accounts
            .expect_fetch_credentials_for_user()
            .withf(|user| user.as_str() == "alice")
            .returning(|_| Ok(vec![released_credential(3, 5)]));
        account_routes(cfg, accounts);
    };
    let (status, body) = get_request(&buyer_token("alice"), "/my_credentials", configure).await;
    assert_eq!(status, StatusCode::OK);
    let credentials: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0]["order_id"], 5);
    assert_eq!(credentials[0]["credential_id"], 3);
    assert_eq!(credentials[0]["username"], "user3@example.com");
    assert_eq!(credentials[0]["password"], "correct horse battery staple");
}

#[actix_web::test]
async fn search_orders() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut accounts = MockAccountManager::new();
        accounts
            .expect_search_orders()
            .withf(|q| {
                q.status == Some(vec![OrderStatusType::Paid, OrderStatusType::Verified]) &&
                    q.currency.as_deref() == Some("BTC")
            })
            .returning(|_| Ok(vec![order(1, "alice", OrderStatusType::Paid, timestamp())]));
        account_routes(cfg, accounts);
    };
    let (status, body) = get_request(&operator_token(), "/orders?status=paid,verified&currency=btc", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);

    let configure = |cfg: &mut ServiceConfig| account_routes(cfg, MockAccountManager::new());
    let (status, _) = get_request(&operator_token(), "/orders?status=shipped", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn expired_orders_report() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut accounts = MockAccountManager::new();
        accounts.expect_search_orders().returning(|_| {
            Ok(vec![
                order(1, "alice", OrderStatusType::AwaitingPayment, Utc::now() - Duration::minutes(30)),
                order(2, "bob", OrderStatusType::AwaitingPayment, Utc::now()),
            ])
        });
        account_routes(cfg, accounts);
    };
    let (status, body) = get_request(&operator_token(), "/orders/expired", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![OrderId(1)]);
}

fn reservation_routes(cfg: &mut ServiceConfig, store: MockOrderStore) {
    let api = ReservationApi::new(store, EventProducers::default());
    cfg.service(ReserveRoute::<MockOrderStore>::new()).app_data(web::Data::new(api));
}

fn flow_routes(cfg: &mut ServiceConfig, store: MockOrderStore) {
    let api = OrderFlowApi::new(store, EventProducers::default());
    cfg.service(ConfirmPaymentRoute::<MockOrderStore>::new())
        .service(CancelOrderRoute::<MockOrderStore>::new())
        .service(UpdateOrderStatusRoute::<MockOrderStore>::new())
        .service(ReleaseOrderRoute::<MockOrderStore>::new())
        .app_data(web::Data::new(api));
}

fn account_routes(cfg: &mut ServiceConfig, accounts: MockAccountManager) {
    let api = AccountApi::new(accounts);
    cfg.service(MyCredentialsRoute::<MockAccountManager>::new())
        .service(ExpiredOrdersRoute::<MockAccountManager>::new())
        .service(SearchOrdersRoute::<MockAccountManager>::new())
        .app_data(web::Data::new(api));
}
