use actix_web::{
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::Utc;
use vault_engine::{
    db_types::{OrderStatusType, Role},
    AccountApi,
};

use super::{
    helpers::{buyer_token, expired_token, get_auth_config, get_request, issue_token, operator_token, order, send_request},
    mocks::MockAccountManager,
};
use crate::{
    auth::{TokenIssuer, ACCESS_TOKEN_HEADER},
    middleware::AuthenticationMiddlewareFactory,
    routes::{MarketplaceStatsRoute, MyOrdersRoute},
};

#[actix_web::test]
async fn fetch_my_orders_no_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/my_orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&buyer_token("alice"), "/my_orders", configure).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["user_id"], "alice");
    assert_eq!(orders[0]["status"], "awaiting_payment");
}

#[actix_web::test]
async fn token_in_custom_header() {
    let _ = env_logger::try_init().ok();
    let token = buyer_token("alice");
    let req = TestRequest::get().uri("/my_orders").insert_header((ACCESS_TOKEN_HEADER, token));
    let app = App::new()
        .wrap(AuthenticationMiddlewareFactory::new(TokenIssuer::new(&get_auth_config())))
        .configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn fetch_my_orders_invalid_sig() {
    let _ = env_logger::try_init().ok();
    let mut token = buyer_token("alice");
    let n = token.len();
    token.replace_range(n - 10..n - 5, "AAAAA");
    let (status, body) = get_request(&token, "/my_orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("signature has failed verification"), "was: {body}");
}

#[actix_web::test]
async fn fetch_my_orders_expired_token() {
    let _ = env_logger::try_init().ok();
    let token = expired_token("alice", vec![Role::User]);
    let (status, body) = get_request(&token, "/my_orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Access token has expired."}"#);
}

#[actix_web::test]
async fn buyers_cannot_use_operator_routes() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&buyer_token("alice"), "/stats", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "was: {body}");
}

#[actix_web::test]
async fn operators_without_the_user_role_cannot_use_buyer_routes() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("ops", vec![Role::Operator]);
    let (status, _) = send_request(Method::GET, &token, "/my_orders", None, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = get_request(&operator_token(), "/stats", configure).await;
    assert_eq!(status, StatusCode::OK);
    let stats: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(stats["active_products"], 0);
    assert_eq!(stats["orders"]["total"], 1);
    assert_eq!(stats["orders"]["pending"], 1);
    assert_eq!(stats["revenue"], 5000);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut account_manager = MockAccountManager::new();
    account_manager
        .expect_fetch_orders_for_user()
        .returning(|user| Ok(vec![order(1, user.as_str(), OrderStatusType::AwaitingPayment, Utc::now())]));
    account_manager.expect_fetch_products().returning(|| Ok(vec![]));
    account_manager
        .expect_search_orders()
        .returning(|_| Ok(vec![order(1, "alice", OrderStatusType::AwaitingPayment, Utc::now())]));
    let accounts_api = AccountApi::new(account_manager);
    cfg.service(MyOrdersRoute::<MockAccountManager>::new())
        .service(MarketplaceStatsRoute::<MockAccountManager>::new())
        .app_data(web::Data::new(accounts_api));
}
