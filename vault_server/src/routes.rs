//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every route under `/api` sits behind the access token middleware, and carries an ACL naming the role it needs.
//! Buyer routes act on the caller's own orders only. Asking about someone else's order looks exactly like asking
//! about an order that does not exist.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. database calls) must be
//! awaited, never blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use vault_engine::{
    db_types::{AddressId, NewCredential, NewDepositAddress, NewProduct, OrderId, ProductId, ProductUpdate, Role},
    order_objects::OrderQueryFilter,
    traits::{
        AccountManagement,
        AddressDirectory,
        Catalog,
        ExchangeRates,
        InventoryManagement,
        MarketplaceDatabase,
    },
    AccountApi,
    AddressApi,
    ExchangeRateApi,
    InventoryApi,
    OrderFlowApi,
    ReservationApi,
};

use crate::{
    auth::AccessClaims,
    data_objects::{
        AvailableCredentials,
        JsonResponse,
        OrderSearchParams,
        RateUpdateRequest,
        ReleasedCredential,
        ReservationRequest,
        StatusUpdateRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Get "/checkout/{product_id}" impl MarketplaceDatabase, Catalog, ExchangeRates, AddressDirectory where requires [Role::User]);
/// The product, with one deposit address per currency and the latest rates, so that the buyer can pick a settlement
/// currency.
pub async fn checkout<B>(
    path: web::Path<ProductId>,
    api: web::Data<ReservationApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase + Catalog + ExchangeRates + AddressDirectory,
{
    let product_id = path.into_inner();
    debug!("💻️ GET checkout options for product {product_id}");
    let options = api.checkout_options(product_id).await?;
    Ok(HttpResponse::Ok().json(options))
}

route!(reserve => Post "/reservations" impl MarketplaceDatabase, Catalog, ExchangeRates, AddressDirectory where requires [Role::User]);
/// Reserves one unit of a product for the caller, payable in the requested currency.
///
/// The response is the new order, which carries the fixed crypto amount, the deposit address id and the deadline
/// (`reserved_until`) for confirming payment.
pub async fn reserve<B>(
    claims: AccessClaims,
    body: web::Json<ReservationRequest>,
    api: web::Data<ReservationApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MarketplaceDatabase + Catalog + ExchangeRates + AddressDirectory,
{
    let ReservationRequest { product_id, currency } = body.into_inner();
    debug!("💻️ POST reservation for product {product_id} in {currency} by {}", claims.user_id);
    let order = api.create_reservation(Some(&claims.user_id), product_id, &currency).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Buyer orders  ----------------------------------------------------
route!(confirm_payment => Post "/orders/{id}/confirm_payment" impl MarketplaceDatabase where requires [Role::User]);
/// The buyer reports that payment has been sent. Only possible while the reservation window is open.
pub async fn confirm_payment<B: MarketplaceDatabase>(
    claims: AccessClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST confirm_payment for order {id} by {}", claims.user_id);
    let order = api.confirm_payment(&claims.buyer(), id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl MarketplaceDatabase where requires [Role::User]);
pub async fn cancel_order<B: MarketplaceDatabase>(
    claims: AccessClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST cancel for order {id} by {}", claims.user_id);
    let order = api.cancel_order(&claims.buyer(), id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(my_orders => Get "/my_orders" impl AccountManagement where requires [Role::User]);
pub async fn my_orders<B: AccountManagement>(
    claims: AccessClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.user_id);
    let orders = api.my_orders(&claims.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_credentials => Get "/my_credentials" impl AccountManagement where requires [Role::User]);
/// The credentials released to the caller. This is the only route that hands out credential secrets to buyers.
pub async fn my_credentials<B: AccountManagement>(
    claims: AccessClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_credentials for {}", claims.user_id);
    let credentials = api.my_credentials(&claims.user_id).await?;
    let credentials = credentials.into_iter().map(ReleasedCredential::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(credentials))
}

route!(my_stats => Get "/my_stats" impl AccountManagement where requires [Role::User]);
pub async fn my_stats<B: AccountManagement>(
    claims: AccessClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_stats for {}", claims.user_id);
    let stats = api.buyer_stats(&claims.user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

//----------------------------------------------   Operator orders  ----------------------------------------------------
route!(update_order_status => Patch "/orders/{id}/status" impl MarketplaceDatabase where requires [Role::Operator]);
/// Moves an order to a new status. Setting `released` triggers credential allocation, exactly like the `release`
/// route.
pub async fn update_order_status<B: MarketplaceDatabase>(
    claims: AccessClaims,
    path: web::Path<OrderId>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ PATCH order {id} status to {status} by {}", claims.user_id);
    let order = api.set_order_status(&claims.operator(), id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(release_order => Post "/orders/{id}/release" impl MarketplaceDatabase where requires [Role::Operator]);
pub async fn release_order<B: MarketplaceDatabase>(
    claims: AccessClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ POST release for order {id} by {}", claims.user_id);
    let released = api.release_order(&claims.operator(), id).await?;
    Ok(HttpResponse::Ok().json(released))
}

route!(search_orders => Get "/orders" impl AccountManagement where requires [Role::Operator]);
/// Order search. All parameters are optional; `status` takes a comma-separated list.
pub async fn search_orders<B: AccountManagement>(
    query: web::Query<OrderSearchParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = OrderQueryFilter::try_from(query.into_inner())?;
    debug!("💻️ GET orders search for [{filter}]");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(expired_orders => Get "/orders/expired" impl AccountManagement where requires [Role::Operator]);
/// Orders still awaiting payment whose reservation window has closed. Nothing is modified.
pub async fn expired_orders<B: AccountManagement>(api: web::Data<AccountApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET expired orders");
    let orders = api.expired_reservations(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_audit => Get "/orders/{id}/audit" impl AccountManagement where requires [Role::Operator]);
pub async fn order_audit<B: AccountManagement>(
    path: web::Path<OrderId>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET audit log for order {id}");
    let entries = api.audit_log(id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

//----------------------------------------------   Inventory  ----------------------------------------------------
route!(create_product => Post "/products" impl InventoryManagement where requires [Role::Operator]);
pub async fn create_product<B: InventoryManagement>(
    claims: AccessClaims,
    body: web::Json<NewProduct>,
    api: web::Data<InventoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = body.into_inner();
    info!("💻️ POST new product '{}' by {}", product.title, claims.user_id);
    let product = api.create_product(product, &claims.operator()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Patch "/products/{id}" impl InventoryManagement where requires [Role::Operator]);
pub async fn update_product<B: InventoryManagement>(
    claims: AccessClaims,
    path: web::Path<ProductId>,
    body: web::Json<ProductUpdate>,
    api: web::Data<InventoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ PATCH product {id} by {}", claims.user_id);
    let product = api.update_product(id, body.into_inner(), &claims.operator()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(provision_credentials => Post "/products/{id}/credentials" impl InventoryManagement where requires [Role::Operator]);
/// Adds credentials to a product's pool. The response does not echo the secrets back.
pub async fn provision_credentials<B: InventoryManagement>(
    claims: AccessClaims,
    path: web::Path<ProductId>,
    body: web::Json<Vec<NewCredential>>,
    api: web::Data<InventoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let credentials = body.into_inner();
    info!("💻️ POST {} credentials for product {id} by {}", credentials.len(), claims.user_id);
    let added = api.provision_credentials(id, credentials, &claims.operator()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{} credentials added to product {id}", added.len()))))
}

route!(available_credentials => Get "/products/{id}/available" impl InventoryManagement where requires [Role::Operator]);
pub async fn available_credentials<B: InventoryManagement>(
    path: web::Path<ProductId>,
    api: web::Data<InventoryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ GET available credentials for product {product_id}");
    let available = api.count_available_credentials(product_id).await?;
    Ok(HttpResponse::Ok().json(AvailableCredentials { product_id, available }))
}

//----------------------------------------------   Exchange rates  ----------------------------------------------------
route!(exchange_rates => Get "/rates" impl ExchangeRates where requires [Role::Operator]);
pub async fn exchange_rates<B: ExchangeRates>(api: web::Data<ExchangeRateApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET exchange rates");
    let rates = api.fetch_latest_rates().await?;
    Ok(HttpResponse::Ok().json(rates))
}

route!(update_exchange_rate => Post "/rates" impl ExchangeRates where requires [Role::Operator]);
pub async fn update_exchange_rate<B: ExchangeRates>(
    claims: AccessClaims,
    body: web::Json<RateUpdateRequest>,
    api: web::Data<ExchangeRateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let rate = request.rate()?;
    info!("💻️ POST exchange rate for {} by {}", request.currency, claims.user_id);
    let rate = api.set_exchange_rate(&request.currency, rate, &claims.operator()).await?;
    Ok(HttpResponse::Ok().json(rate))
}

//----------------------------------------------   Deposit addresses  ----------------------------------------------------
route!(add_address => Post "/addresses" impl AddressDirectory where requires [Role::Operator]);
pub async fn add_address<B: AddressDirectory>(
    body: web::Json<NewDepositAddress>,
    api: web::Data<AddressApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let address = body.into_inner();
    info!("💻️ POST new {} deposit address", address.currency);
    let address = api.add_address(address).await?;
    Ok(HttpResponse::Ok().json(address))
}

route!(deactivate_address => Post "/addresses/{id}/deactivate" impl AddressDirectory where requires [Role::Operator]);
pub async fn deactivate_address<B: AddressDirectory>(
    path: web::Path<AddressId>,
    api: web::Data<AddressApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ POST deactivate deposit address {id}");
    let address = api.deactivate_address(id).await?;
    Ok(HttpResponse::Ok().json(address))
}

//----------------------------------------------   Stats  ----------------------------------------------------
route!(marketplace_stats => Get "/stats" impl AccountManagement, Catalog where requires [Role::Operator]);
pub async fn marketplace_stats<B>(api: web::Data<AccountApi<B>>) -> Result<HttpResponse, ServerError>
where B: AccountManagement + Catalog {
    debug!("💻️ GET marketplace stats");
    let stats = api.marketplace_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
