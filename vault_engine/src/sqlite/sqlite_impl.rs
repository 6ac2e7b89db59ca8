//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use serde_json::json;
use sqlx::{migrate, SqlitePool};

use super::db::{addresses, audit, credentials, db_url, exchange_rates, new_pool, orders, products};
use crate::{
    db_types::{
        Actor,
        AddressId,
        AuditEntry,
        Credential,
        DepositAddress,
        NewCredential,
        NewDepositAddress,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ProductId,
        ProductUpdate,
        UserId,
    },
    market_api::{exchange_objects::ExchangeRate, order_objects::OrderQueryFilter},
    traits::{
        AccountApiError,
        AccountManagement,
        AddressDirectory,
        Catalog,
        ExchangeRateError,
        ExchangeRates,
        InventoryManagement,
        MarketplaceDatabase,
        MarketplaceError,
        ReleasedOrder,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_reservation(&self, order: NewOrder) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        let actor = Actor::buyer(order.user_id.clone());
        let meta = json!({
            "product_id": order.product_id,
            "currency": order.currency,
            "total_usd": order.total_usd,
            "amount_crypto": order.amount_crypto,
        });
        audit::record(&actor, "reserve", audit::TARGET_ORDER, order.id.value(), meta, order.created_at, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        actor: &Actor,
    ) -> Result<Order, MarketplaceError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::update_order_status(id, from, to, now, &mut tx).await? else {
            tx.rollback().await?;
            return Err(self.explain_missed_update(id, to).await);
        };
        let meta = json!({ "from": from, "to": to });
        audit::record(actor, "status_change", audit::TARGET_ORDER, id.value(), meta, now, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {id} moved from {from} to {to} by {actor}");
        Ok(order)
    }

    /// The allocation happens in a single transaction:
    /// * The order is moved to `released`, but only if it is currently `paid` or `verified`. This is the first write in
    ///   the transaction, so concurrent allocations queue up behind it.
    /// * The oldest available credential for the product is bound to the order. If there are none, the transaction is
    ///   rolled back, and the order keeps its previous status.
    /// * The product's stock is reduced by one.
    /// * An audit entry is written.
    async fn allocate_credential(&self, id: OrderId, actor: &Actor) -> Result<ReleasedOrder, MarketplaceError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let Some((previous, order)) = orders::mark_released(id, now, &mut tx).await? else {
            tx.rollback().await?;
            return Err(self.explain_missed_update(id, OrderStatusType::Released).await);
        };
        let Some(credential) = credentials::claim_available(order.product_id, id, now, &mut tx).await? else {
            tx.rollback().await?;
            warn!("🔐️ No credential is available for product {} (order {id}). Allocation rolled back.", order.product_id);
            return Err(MarketplaceError::NoCredentialAvailable(order.product_id));
        };
        if !products::decrement_stock(order.product_id, &mut tx).await? {
            warn!("🔐️ Product {} had no stock left to decrement when releasing order {id}", order.product_id);
        }
        let meta = json!({ "from": previous, "to": OrderStatusType::Released, "credential_id": credential.id });
        audit::record(actor, "release", audit::TARGET_ORDER, id.value(), meta, now, &mut tx).await?;
        tx.commit().await?;
        info!("🔐️ Credential {} released to order {id} by {actor}", credential.id);
        Ok(ReleasedOrder::new(order, credential))
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl Catalog for SqliteDatabase {
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(&mut conn).await?;
        Ok(products)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product {} ({}) created", product.id, product.title);
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let product = products::update_product(id, update, &mut tx).await?;
        tx.commit().await?;
        product.ok_or(MarketplaceError::ProductNotFound(id))
    }

    async fn provision_credentials(
        &self,
        product_id: ProductId,
        credentials: Vec<NewCredential>,
        actor: &Actor,
    ) -> Result<Vec<Credential>, MarketplaceError> {
        let now = Utc::now();
        let count = credentials.len() as i64;
        let mut tx = self.pool.begin().await?;
        if !products::increase_stock(product_id, count, &mut tx).await? {
            tx.rollback().await?;
            return Err(MarketplaceError::ProductNotFound(product_id));
        }
        let mut result = Vec::with_capacity(credentials.len());
        for credential in credentials {
            let credential = credentials::insert_credential(product_id, credential, now, &mut tx).await?;
            result.push(credential);
        }
        let meta = json!({ "count": count });
        audit::record(actor, "provision", audit::TARGET_PRODUCT, product_id.value(), meta, now, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ {count} credentials provisioned for product {product_id} by {actor}");
        Ok(result)
    }

    async fn count_available_credentials(&self, product_id: ProductId) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let count = credentials::count_available(product_id, &mut conn).await?;
        Ok(count)
    }
}

impl ExchangeRates for SqliteDatabase {
    async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError> {
        let mut conn = self.pool.acquire().await?;
        exchange_rates::fetch_last_rate(currency, &mut conn).await
    }

    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError> {
        if !rate.rate_usd.is_valid() {
            return Err(ExchangeRateError::InvalidRate(rate.to_string()));
        }
        let mut conn = self.pool.acquire().await?;
        exchange_rates::set_exchange_rate(rate, &mut conn).await
    }

    async fn fetch_latest_rates(&self) -> Result<Vec<ExchangeRate>, ExchangeRateError> {
        let mut conn = self.pool.acquire().await?;
        exchange_rates::fetch_latest_rates(&mut conn).await
    }
}

impl AddressDirectory for SqliteDatabase {
    async fn fetch_active_addresses(&self) -> Result<Vec<DepositAddress>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let addresses = addresses::fetch_active_addresses(&mut conn).await?;
        Ok(addresses)
    }

    async fn insert_deposit_address(&self, address: NewDepositAddress) -> Result<DepositAddress, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let address = addresses::insert_address(address, &mut tx).await?;
        tx.commit().await?;
        Ok(address)
    }

    async fn set_address_active(&self, id: AddressId, active: bool) -> Result<DepositAddress, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let address = addresses::set_active(id, active, &mut tx).await?;
        tx.commit().await?;
        address.ok_or_else(|| MarketplaceError::InvalidRequest(format!("Deposit address {id} does not exist")))
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_credentials_for_user(&self, user_id: &UserId) -> Result<Vec<Credential>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let credentials = credentials::fetch_released_for_user(user_id, &mut conn).await?;
        Ok(credentials)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_audit_log(&self, order_id: OrderId) -> Result<Vec<AuditEntry>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit::fetch_for_order(order_id, &mut conn).await?;
        Ok(entries)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// A status write matched no row. Work out whether the order is missing or was in the wrong state.
    async fn explain_missed_update(&self, id: OrderId, to: OrderStatusType) -> MarketplaceError {
        match self.fetch_order(id).await {
            Ok(Some(order)) => MarketplaceError::InvalidTransition { from: order.status, to },
            Ok(None) => MarketplaceError::OrderNotFound(id),
            Err(e) => e,
        }
    }
}
