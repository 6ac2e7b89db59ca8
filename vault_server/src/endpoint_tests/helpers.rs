use actix_web::{
    body::to_bytes,
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::debug;
use vault_common::{CryptoAmount, UsdCents};
use vault_engine::db_types::{
    Credential,
    CredentialId,
    CredentialStatus,
    Order,
    OrderId,
    OrderStatusType,
    Product,
    ProductId,
    ProductStatus,
    Role,
};

use crate::{
    auth::{AccessClaims, TokenIssuer},
    config::AuthConfig,
    middleware::AuthenticationMiddlewareFactory,
};

// DO NOT re-use this secret anywhere.
const TEST_SECRET: &[u8; 32] = b"not-a-secret-only-for-the-tests!";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_SECRET, Duration::hours(1)).unwrap()
}

pub fn issue_token(user: &str, roles: Vec<Role>) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user.into(), roles, None).unwrap()
}

pub fn expired_token(user: &str, roles: Vec<Role>) -> String {
    let claims = AccessClaims { user_id: user.into(), roles, exp: (Utc::now() - Duration::minutes(5)).timestamp() };
    TokenIssuer::new(&get_auth_config()).sign_claims(&claims).unwrap()
}

pub fn buyer_token(user: &str) -> String {
    issue_token(user, vec![Role::User])
}

pub fn operator_token() -> String {
    issue_token("operator-1", vec![Role::User, Role::Operator])
}

/// Sends a request through the authentication middleware to the routes set up by `configure`, and returns the status
/// and body. Errors raised by middleware are rendered the same way the server would render them.
pub async fn send_request<F>(
    method: Method,
    token: &str,
    path: &str,
    body: Option<serde_json::Value>,
    configure: F,
) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::default().method(method).uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let app = App::new()
        .wrap(AuthenticationMiddlewareFactory::new(TokenIssuer::new(&get_auth_config())))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request to {path}");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub async fn get_request<F>(token: &str, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::GET, token, path, None, configure).await
}

pub async fn post_request<F>(token: &str, path: &str, body: serde_json::Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::POST, token, path, Some(body), configure).await
}

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap()
}

pub fn product(id: i64, stock: i64) -> Product {
    Product {
        id: ProductId(id),
        title: format!("Streaming account #{id}"),
        description: None,
        price_usd: UsdCents::from(5000),
        stock,
        status: ProductStatus::Available,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn order(id: i64, user: &str, status: OrderStatusType, created_at: DateTime<Utc>) -> Order {
    Order {
        id: OrderId(id),
        user_id: user.into(),
        product_id: ProductId(1),
        quantity: 1,
        currency: "BTC".into(),
        total_usd: UsdCents::from(5000),
        amount_crypto: CryptoAmount::from(100_000),
        deposit_address_id: None,
        status,
        created_at,
        reserved_until: created_at + Duration::minutes(15),
        updated_at: created_at,
    }
}

pub fn released_credential(id: i64, order_id: i64) -> Credential {
    Credential {
        id: CredentialId(id),
        product_id: ProductId(1),
        username: format!("user{id}@example.com"),
        password: "correct horse battery staple".into(),
        notes: None,
        status: CredentialStatus::Released,
        assigned_order_id: Some(OrderId(order_id)),
        created_at: timestamp(),
        released_at: Some(timestamp()),
    }
}
