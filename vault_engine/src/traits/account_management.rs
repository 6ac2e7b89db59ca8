use thiserror::Error;

use crate::{
    db_types::{AuditEntry, Credential, Order, OrderId, UserId},
    market_api::order_objects::OrderQueryFilter,
    traits::MarketplaceError,
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

impl From<MarketplaceError> for AccountApiError {
    fn from(e: MarketplaceError) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait provides read access to what a buyer owns, and to the operator's view over all
/// orders.
///
/// The [`MarketplaceDatabase`](crate::traits::MarketplaceDatabase) trait handles the machinery of changing order state.
/// Nothing in here writes.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// All orders created by the given buyer, oldest first.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, AccountApiError>;

    /// The released credentials bound to orders owned by the given buyer. Credentials bound to anyone else's orders
    /// are never returned.
    async fn fetch_credentials_for_user(&self, user_id: &UserId) -> Result<Vec<Credential>, AccountApiError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, AccountApiError>;

    /// The audit trail for the given order, oldest entry first.
    async fn fetch_audit_log(&self, order_id: OrderId) -> Result<Vec<AuditEntry>, AccountApiError>;
}
