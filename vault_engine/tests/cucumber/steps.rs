use std::str::FromStr;

use chrono::{Duration, Utc};
use cucumber::{given, then, when};
use vault_engine::{
    db_types::{Actor, CryptoAmount, NewCredential, NewOrder, NewProduct, OrderStatusType, UsdCents, UsdRate},
    MarketplaceDatabase,
    MarketplaceError,
};

use crate::cucumber::MarketplaceWorld;

const OPERATOR: &str = "operator-1";

fn operator() -> Actor {
    Actor::operator(OPERATOR)
}

fn error_name(e: &MarketplaceError) -> &'static str {
    match e {
        MarketplaceError::DatabaseError(_) => "DatabaseError",
        MarketplaceError::AuthRequired => "AuthRequired",
        MarketplaceError::ProductNotFound(_) => "ProductNotFound",
        MarketplaceError::ProductUnavailable(_) => "ProductUnavailable",
        MarketplaceError::RateUnavailable(_) => "RateUnavailable",
        MarketplaceError::OrderNotFound(_) => "OrderNotFound",
        MarketplaceError::InvalidTransition { .. } => "InvalidTransition",
        MarketplaceError::Expired(_) => "Expired",
        MarketplaceError::NoCredentialAvailable(_) => "NoCredentialAvailable",
        MarketplaceError::InvalidRequest(_) => "InvalidRequest",
    }
}

#[given(expr = "a product {string} priced at ${word} with {int} credential(s)")]
async fn product_with_credentials(world: &mut MarketplaceWorld, name: String, price: String, count: usize) {
    add_product(world, name.clone(), price, 0).await;
    let id = world.product(&name);
    let credentials = (0..count).map(|i| NewCredential::new(format!("{name}-{i}"), format!("pw-{i}"))).collect();
    world
        .system()
        .inventory
        .provision_credentials(id, credentials, &operator())
        .await
        .expect("Error provisioning credentials");
}

#[given(expr = "a product {string} priced at ${word} with stock {int} and no credentials")]
async fn product_without_credentials(world: &mut MarketplaceWorld, name: String, price: String, stock: i64) {
    add_product(world, name, price, stock).await;
}

async fn add_product(world: &mut MarketplaceWorld, name: String, price: String, stock: i64) {
    let price = UsdCents::from_str(&price).expect("Invalid price");
    let product = NewProduct::new(name.clone(), price).with_stock(stock);
    let product = world.system().inventory.create_product(product, &operator()).await.expect("Error creating product");
    world.products.insert(name, product.id);
}

#[given(expr = "the {word} rate is ${word}")]
async fn set_rate(world: &mut MarketplaceWorld, currency: String, rate: String) {
    let rate = UsdRate::from_str(&rate).expect("Invalid rate");
    world.system().rates.set_exchange_rate(&currency, rate, &operator()).await.expect("Error setting rate");
}

#[given(expr = "{word} holds a {word} reservation for {string} made {int} minutes ago")]
async fn stale_reservation(world: &mut MarketplaceWorld, buyer: String, currency: String, name: String, minutes: i64) {
    let product = world.product(&name);
    let created_at = Utc::now() - Duration::minutes(minutes);
    let price = world.system().inventory.fetch_product(product).await.expect("Unknown product").price_usd;
    let order =
        NewOrder::new(buyer.as_str().into(), product, currency, price, CryptoAmount::from(100_000), created_at);
    let order = world.system().db.insert_reservation(order).await.expect("Error inserting order");
    world.orders.insert(buyer, order.id);
}

#[when(expr = "{word} reserves {string} in {word}")]
async fn reserve(world: &mut MarketplaceWorld, buyer: String, name: String, currency: String) {
    let product = world.product(&name);
    let result = world.system().reservations.create_reservation(Some(&buyer.as_str().into()), product, &currency).await;
    if let Some(order) = world.record(result) {
        world.orders.insert(buyer, order.id);
    }
}

#[when(expr = "an anonymous visitor reserves {string} in {word}")]
async fn anonymous_reservation(world: &mut MarketplaceWorld, name: String, currency: String) {
    let product = world.product(&name);
    let result = world.system().reservations.create_reservation(None, product, &currency).await;
    world.record(result);
}

#[when(expr = "{word} confirms payment")]
async fn confirm_payment(world: &mut MarketplaceWorld, buyer: String) {
    let id = world.order_of(&buyer);
    let result = world.system().flow.confirm_payment(&Actor::buyer(buyer.as_str()), id).await;
    world.record(result);
}

#[when(expr = "{word} confirms payment for {word}'s order")]
async fn confirm_someone_elses_payment(world: &mut MarketplaceWorld, buyer: String, owner: String) {
    let id = world.order_of(&owner);
    let result = world.system().flow.confirm_payment(&Actor::buyer(buyer.as_str()), id).await;
    world.record(result);
}

#[when(expr = "{word} cancels the order")]
async fn cancel_order(world: &mut MarketplaceWorld, buyer: String) {
    let id = world.order_of(&buyer);
    let result = world.system().flow.cancel_order(&Actor::buyer(buyer.as_str()), id).await;
    world.record(result);
}

#[when(expr = "the operator sets {word}'s order to {word}")]
async fn set_status(world: &mut MarketplaceWorld, buyer: String, status: String) {
    let id = world.order_of(&buyer);
    let status = OrderStatusType::from_str(&status).expect("Invalid status");
    let result = world.system().flow.set_order_status(&operator(), id, status).await;
    world.record(result);
}

#[when(expr = "the operator releases {word}'s order")]
async fn release(world: &mut MarketplaceWorld, buyer: String) {
    let id = world.order_of(&buyer);
    let result = world.system().flow.release_order(&operator(), id).await;
    world.record(result);
}

#[when(expr = "the operator provisions {int} more credentials for {string}")]
async fn provision_more(world: &mut MarketplaceWorld, count: usize, name: String) {
    let id = world.product(&name);
    let credentials = (0..count).map(|i| NewCredential::new(format!("{name}-extra-{i}"), format!("pw-{i}"))).collect();
    let result = world.system().inventory.provision_credentials(id, credentials, &operator()).await;
    world.record(result);
}

#[then(expr = "{word}'s order is {word}")]
async fn check_status(world: &mut MarketplaceWorld, buyer: String, status: String) {
    let id = world.order_of(&buyer);
    let order = world.system().db.fetch_order(id).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.status.to_string(), status);
}

#[then(expr = "{word}'s order is payable as {word} {word} until {int} minutes after it was placed")]
async fn check_amount(world: &mut MarketplaceWorld, buyer: String, amount: String, currency: String, minutes: i64) {
    let id = world.order_of(&buyer);
    let order = world.system().db.fetch_order(id).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.amount_crypto.to_string(), amount);
    assert_eq!(order.currency, currency);
    assert_eq!(order.reserved_until - order.created_at, Duration::minutes(minutes));
}

#[then(expr = "the request fails with {word}")]
async fn check_error(world: &mut MarketplaceWorld, expected: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    assert_eq!(error_name(err), expected, "Unexpected error: {err}");
}

#[then("the request succeeds")]
async fn check_success(world: &mut MarketplaceWorld) {
    assert!(world.last_error.is_none(), "The last request failed: {:?}", world.last_error);
}

#[then(expr = "{word} can see {int} credential(s)")]
async fn check_credentials(world: &mut MarketplaceWorld, buyer: String, count: usize) {
    let credentials =
        world.system().accounts.my_credentials(&buyer.as_str().into()).await.expect("Error fetching credentials");
    assert_eq!(credentials.len(), count);
}

#[then(expr = "{string} has {int} available credential(s) and stock {int}")]
async fn check_pool(world: &mut MarketplaceWorld, name: String, available: i64, stock: i64) {
    let id = world.product(&name);
    let count = world.system().inventory.count_available_credentials(id).await.expect("Error counting credentials");
    assert_eq!(count, available);
    let product = world.system().inventory.fetch_product(id).await.expect("Unknown product");
    assert_eq!(product.stock, stock);
}

#[then(expr = "{word} has {int} order(s)")]
async fn check_order_count(world: &mut MarketplaceWorld, buyer: String, count: usize) {
    let orders = world.system().accounts.my_orders(&buyer.as_str().into()).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}
