use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use chrono::Utc;
use serde_json::json;
use vault_common::UsdRate;
use vault_engine::{
    db_types::{AddressId, Credential, CredentialId, CredentialStatus, DepositAddress, Product, ProductId},
    market_api::exchange_objects::ExchangeRate,
    AddressApi,
    ExchangeRateApi,
    InventoryApi,
};

use super::{
    helpers::*,
    mocks::{MockInventory, MockOrderStore},
};
use crate::routes::{
    AddAddressRoute,
    AvailableCredentialsRoute,
    CreateProductRoute,
    DeactivateAddressRoute,
    ExchangeRatesRoute,
    ProvisionCredentialsRoute,
    UpdateExchangeRateRoute,
    UpdateProductRoute,
};

//------------------------------------------------   Products  ---------------------------------------------------

#[actix_web::test]
async fn create_product() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut inventory = MockInventory::new();
        inventory.expect_insert_product().times(1).returning(|p| {
            let mut product = product(8, p.stock);
            product.title = p.title;
            product.price_usd = p.price_usd;
            Ok(product)
        });
        inventory_routes(cfg, inventory);
    };
    let body = json!({ "title": "Premium VPN, 1 year", "description": null, "price_usd": 2500 });
    let (status, body) = post_request(&operator_token(), "/products", body, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let product: Product = serde_json::from_str(&body).unwrap();
    assert_eq!(product.id, ProductId(8));
    assert_eq!(product.title, "Premium VPN, 1 year");
    assert_eq!(product.price_usd.value(), 2500);
    assert_eq!(product.stock, 0);
}

#[actix_web::test]
async fn create_product_with_bad_price() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut inventory = MockInventory::new();
        inventory.expect_insert_product().never();
        inventory_routes(cfg, inventory);
    };
    let body = json!({ "title": "Free lunch", "description": null, "price_usd": 0 });
    let (status, body) = post_request(&operator_token(), "/products", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: The price must be positive"}"#);
}

#[actix_web::test]
async fn buyers_cannot_create_products() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| inventory_routes(cfg, MockInventory::new());
    let body = json!({ "title": "Premium VPN, 1 year", "description": null, "price_usd": 2500 });
    let (status, _) = post_request(&buyer_token("alice"), "/products", body, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn update_missing_product() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut inventory = MockInventory::new();
        inventory.expect_update_product().returning(|id, _| Err(vault_engine::MarketplaceError::ProductNotFound(id)));
        inventory_routes(cfg, inventory);
    };
    let body = Some(json!({ "stock": 4 }));
    let (status, body) = send_request(Method::PATCH, &operator_token(), "/products/99", body, configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Product #99 does not exist"}"#);
}

//------------------------------------------------   Credentials  ---------------------------------------------------

#[actix_web::test]
async fn provision_credentials() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut inventory = MockInventory::new();
        inventory
            .expect_provision_credentials()
            .withf(|id, creds, actor| *id == ProductId(2) && creds.len() == 2 && actor.is_operator())
            .times(1)
            .returning(|id, creds, _| {
                let added = creds
                    .into_iter()
                    .enumerate()
                    .map(|(i, c)| Credential {
                        id: CredentialId(i as i64 + 1),
                        product_id: id,
                        username: c.username,
                        password: c.password,
                        notes: c.notes,
                        status: CredentialStatus::Available,
                        assigned_order_id: None,
                        created_at: Utc::now(),
                        released_at: None,
                    })
                    .collect();
                Ok(added)
            });
        inventory_routes(cfg, inventory);
    };
    let body = json!([
        { "username": "alice@streaming.test", "password": "hunter2", "notes": null },
        { "username": "bob@streaming.test", "password": "swordfish", "notes": "Family plan" },
    ]);
    let (status, body) = post_request(&operator_token(), "/products/2/credentials", body, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, r#"{"success":true,"message":"2 credentials added to product #2"}"#);
    assert!(!body.contains("hunter2"));
}

#[actix_web::test]
async fn provision_nothing() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut inventory = MockInventory::new();
        inventory.expect_provision_credentials().never();
        inventory_routes(cfg, inventory);
    };
    let (status, _) = post_request(&operator_token(), "/products/2/credentials", json!([]), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn available_credentials() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut inventory = MockInventory::new();
        inventory.expect_count_available_credentials().withf(|id| *id == ProductId(2)).returning(|_| Ok(7));
        inventory_routes(cfg, inventory);
    };
    let (status, body) = get_request(&operator_token(), "/products/2/available", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"product_id":2,"available":7}"#);
}

//------------------------------------------------   Exchange rates  ---------------------------------------------------

#[actix_web::test]
async fn fetch_rates() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_fetch_latest_rates().returning(|| {
            Ok(vec![
                ExchangeRate::new("BTC".into(), UsdRate::from_dollars(50_000), Some(timestamp())),
                ExchangeRate::new("ETH".into(), UsdRate::from_dollars(3_000), Some(timestamp())),
            ])
        });
        rate_routes(cfg, store);
    };
    let (status, body) = get_request(&operator_token(), "/rates", configure).await;
    assert_eq!(status, StatusCode::OK);
    let rates: Vec<ExchangeRate> = serde_json::from_str(&body).unwrap();
    assert_eq!(rates.len(), 2);
    assert_eq!(rates[0].currency, "BTC");
    assert_eq!(rates[1].rate_usd, UsdRate::from_dollars(3_000));
}

#[actix_web::test]
async fn update_rate() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store
            .expect_set_exchange_rate()
            .withf(|r| {
                r.currency == "ETH" &&
                    r.rate_usd == UsdRate::from(3_150_250_000_000_000) &&
                    r.updated_by.as_deref() == Some("operator-1")
            })
            .times(1)
            .returning(|_| Ok(()));
        rate_routes(cfg, store);
    };
    let body = json!({ "currency": "eth", "rate": "3150.25" });
    let (status, body) = post_request(&operator_token(), "/rates", body, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let rate: ExchangeRate = serde_json::from_str(&body).unwrap();
    assert_eq!(rate.currency, "ETH");
}

#[actix_web::test]
async fn update_rate_with_nonsense() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store.expect_set_exchange_rate().never();
        rate_routes(cfg, store);
    };
    let body = json!({ "currency": "BTC", "rate": "a lot" });
    let (status, _) = post_request(&operator_token(), "/rates", body.clone(), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json!({ "currency": "BTC", "rate": "0" });
    let (status, body) = post_request(&operator_token(), "/rates", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("rate must be positive"), "was: {body}");
}

//------------------------------------------------   Deposit addresses  ---------------------------------------------------

#[actix_web::test]
async fn add_and_deactivate_address() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut store = MockOrderStore::new();
        store
            .expect_insert_deposit_address()
            .withf(|a| a.currency == "USDT" && a.address == "TXyz123")
            .returning(|a| Ok(deposit_address(4, a.currency, a.address, true)));
        store
            .expect_set_address_active()
            .withf(|id, active| *id == AddressId(4) && !active)
            .returning(|id, _| Ok(deposit_address(id.value(), "USDT".into(), "TXyz123".into(), false)));
        address_routes(cfg, store);
    };
    let body = json!({ "currency": "usdt", "network": "TRC20", "address": "  TXyz123 ", "label": null });
    let (status, body) = post_request(&operator_token(), "/addresses", body, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let address: DepositAddress = serde_json::from_str(&body).unwrap();
    assert_eq!(address.id, AddressId(4));
    assert!(address.active);

    let (status, body) = post_request(&operator_token(), "/addresses/4/deactivate", json!({}), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let address: DepositAddress = serde_json::from_str(&body).unwrap();
    assert!(!address.active);
}

fn deposit_address(id: i64, currency: String, address: String, active: bool) -> DepositAddress {
    DepositAddress {
        id: AddressId(id),
        currency,
        network: Some("TRC20".into()),
        address,
        label: None,
        active,
        created_at: timestamp(),
    }
}

fn inventory_routes(cfg: &mut ServiceConfig, inventory: MockInventory) {
    let api = InventoryApi::new(inventory);
    cfg.service(CreateProductRoute::<MockInventory>::new())
        .service(UpdateProductRoute::<MockInventory>::new())
        .service(ProvisionCredentialsRoute::<MockInventory>::new())
        .service(AvailableCredentialsRoute::<MockInventory>::new())
        .app_data(web::Data::new(api));
}

fn rate_routes(cfg: &mut ServiceConfig, store: MockOrderStore) {
    let api = ExchangeRateApi::new(store);
    cfg.service(ExchangeRatesRoute::<MockOrderStore>::new())
        .service(UpdateExchangeRateRoute::<MockOrderStore>::new())
        .app_data(web::Data::new(api));
}

fn address_routes(cfg: &mut ServiceConfig, store: MockOrderStore) {
    let api = AddressApi::new(store);
    cfg.service(AddAddressRoute::<MockOrderStore>::new())
        .service(DeactivateAddressRoute::<MockOrderStore>::new())
        .app_data(web::Data::new(api));
}
