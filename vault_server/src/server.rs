use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use vault_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AccountApi,
    AddressApi,
    ExchangeRateApi,
    InventoryApi,
    OrderFlowApi,
    ReservationApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    middleware::AuthenticationMiddlewareFactory,
    routes::{
        health,
        AddAddressRoute,
        AvailableCredentialsRoute,
        CancelOrderRoute,
        CheckoutRoute,
        ConfirmPaymentRoute,
        CreateProductRoute,
        DeactivateAddressRoute,
        ExchangeRatesRoute,
        ExpiredOrdersRoute,
        MarketplaceStatsRoute,
        MyCredentialsRoute,
        MyOrdersRoute,
        MyStatsRoute,
        OrderAuditRoute,
        ProvisionCredentialsRoute,
        ReleaseOrderRoute,
        ReserveRoute,
        SearchOrdersRoute,
        UpdateExchangeRateRoute,
        UpdateOrderStatusRoute,
        UpdateProductRoute,
    },
};

const DB_MAX_CONNECTIONS: u32 = 25;
const HOOK_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_MAX_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        info!("🚀️ Running database migrations");
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    let handlers = EventHandlers::new(HOOK_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that record every reservation, transition and release in the log.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_reserved(|ev| {
        Box::pin(async move {
            info!("📬️ Order {} reserved by {}, payable until {}", ev.order.id, ev.order.user_id, ev.order.reserved_until)
        })
    });
    hooks.on_status_changed(|ev| {
        Box::pin(async move { info!("📬️ Order {} moved from {} to {}", ev.order.id, ev.old_status, ev.order.status) })
    });
    hooks.on_order_released(|ev| {
        Box::pin(async move { info!("📬️ Credential {} released to order {}", ev.credential_id, ev.order.id) })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let reservation_api = ReservationApi::new(db.clone(), producers.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let accounts_api = AccountApi::new(db.clone());
        let inventory_api = InventoryApi::new(db.clone());
        let rates_api = ExchangeRateApi::new(db.clone());
        let address_api = AddressApi::new(db.clone());
        let issuer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("vault::access_log"))
            .app_data(web::Data::new(reservation_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(inventory_api))
            .app_data(web::Data::new(rates_api))
            .app_data(web::Data::new(address_api));
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .wrap(AuthenticationMiddlewareFactory::new(issuer))
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(ReserveRoute::<SqliteDatabase>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyCredentialsRoute::<SqliteDatabase>::new())
            .service(MyStatsRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(ReleaseOrderRoute::<SqliteDatabase>::new())
            .service(ExpiredOrdersRoute::<SqliteDatabase>::new())
            .service(SearchOrdersRoute::<SqliteDatabase>::new())
            .service(OrderAuditRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(ProvisionCredentialsRoute::<SqliteDatabase>::new())
            .service(AvailableCredentialsRoute::<SqliteDatabase>::new())
            .service(ExchangeRatesRoute::<SqliteDatabase>::new())
            .service(UpdateExchangeRateRoute::<SqliteDatabase>::new())
            .service(AddAddressRoute::<SqliteDatabase>::new())
            .service(DeactivateAddressRoute::<SqliteDatabase>::new())
            .service(MarketplaceStatsRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
