use thiserror::Error;

use crate::{
    db_types::{Actor, NewOrder, Order, OrderId, OrderStatusType, ProductId},
    traits::{ExchangeRateError, ReleasedOrder},
};

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("An authenticated user is required for this operation")]
    AuthRequired,
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {0} is not available for reservation")]
    ProductUnavailable(ProductId),
    #[error("No exchange rate is available for {0}")]
    RateUnavailable(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("An order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("The reservation window for order {0} has closed. Please start checkout again")]
    Expired(OrderId),
    #[error("There are no credentials available for product {0}")]
    NoCredentialAvailable(ProductId),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}

impl From<ExchangeRateError> for MarketplaceError {
    fn from(e: ExchangeRateError) -> Self {
        match e {
            ExchangeRateError::RateDoesNotExist(cur) => MarketplaceError::RateUnavailable(cur),
            ExchangeRateError::InvalidRate(s) => MarketplaceError::RateUnavailable(s),
            ExchangeRateError::DatabaseError(s) => MarketplaceError::DatabaseError(s),
        }
    }
}

/// This trait defines the highest level of behaviour for backends supporting the marketplace engine.
///
/// Implementations must give each method the atomicity described on it. In particular, the status writes are
/// compare-and-set operations, and [`MarketplaceDatabase::allocate_credential`] must be linearizable with respect to
/// every other allocation against the same credential pool.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Persists a new reservation in the `awaiting_payment` state and returns it.
    async fn insert_reservation(&self, order: NewOrder) -> Result<Order, MarketplaceError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, MarketplaceError>;

    /// Moves the order from `from` to `to`, stamping `updated_at` and writing an audit entry.
    ///
    /// The write only happens if the stored status is still `from`. Otherwise nothing changes and
    /// [`MarketplaceError::InvalidTransition`] (or [`MarketplaceError::OrderNotFound`]) is returned. Permission checks
    /// are the caller's responsibility.
    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        actor: &Actor,
    ) -> Result<Order, MarketplaceError>;

    /// In one atomic step, binds an available credential for the order's product to the order and moves the order to
    /// `released`.
    ///
    /// * If the order is not `paid` or `verified`, fails with [`MarketplaceError::InvalidTransition`].
    /// * If the product has no available credential, fails with [`MarketplaceError::NoCredentialAvailable`].
    ///
    /// On failure neither the order nor the credential pool is modified.
    async fn allocate_credential(&self, id: OrderId, actor: &Actor) -> Result<ReleasedOrder, MarketplaceError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}
