//! Read-only views over orders and credentials, for buyers and operators.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::trace;

use crate::{
    db_types::{AuditEntry, Credential, Order, OrderId, OrderStatusType, UserId},
    market_api::order_objects::{MarketplaceStats, OrderQueryFilter, OrderStats},
    traits::{AccountApiError, AccountManagement, Catalog},
};

/// The `AccountApi` answers the buyer dashboard and operator reporting queries.
pub struct AccountApi<B> {
    db: B,
}

impl<B> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi")
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// All orders placed by the buyer, oldest first.
    pub async fn my_orders(&self, user_id: &UserId) -> Result<Vec<Order>, AccountApiError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    /// Credentials that have been released to the buyer's orders. Nobody else's credentials are ever included.
    pub async fn my_credentials(&self, user_id: &UserId) -> Result<Vec<Credential>, AccountApiError> {
        let credentials = self.db.fetch_credentials_for_user(user_id).await?;
        trace!("🗃️ {} credentials released to {user_id}", credentials.len());
        Ok(credentials)
    }

    pub async fn buyer_stats(&self, user_id: &UserId) -> Result<OrderStats, AccountApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(OrderStats::tally(&orders))
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError> {
        trace!("🗃️ Searching orders. {query}");
        self.db.search_orders(query).await
    }

    /// Orders still awaiting payment whose reservation window closed before `now`.
    ///
    /// Nothing is changed. Expiry is a property of the order and the clock, and this is just a report of it.
    pub async fn expired_reservations(&self, now: DateTime<Utc>) -> Result<Vec<Order>, AccountApiError> {
        let query = OrderQueryFilter::default().with_status(OrderStatusType::AwaitingPayment);
        let orders = self.db.search_orders(query).await?;
        Ok(orders.into_iter().filter(|o| o.is_expired_at(now)).collect())
    }

    pub async fn audit_log(&self, order_id: OrderId) -> Result<Vec<AuditEntry>, AccountApiError> {
        self.db.fetch_audit_log(order_id).await
    }
}

impl<B> AccountApi<B>
where B: AccountManagement + Catalog
{
    /// Operator dashboard figures.
    pub async fn marketplace_stats(&self) -> Result<MarketplaceStats, AccountApiError> {
        let products = self.db.fetch_products().await?;
        let active_products = products.iter().filter(|p| p.is_reservable()).count();
        let orders = self.db.search_orders(OrderQueryFilter::default()).await?;
        let revenue = orders.iter().map(|o| o.total_usd).sum();
        Ok(MarketplaceStats { active_products, orders: OrderStats::tally(&orders), revenue })
    }
}
