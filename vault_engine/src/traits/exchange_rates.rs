use thiserror::Error;

use crate::market_api::exchange_objects::ExchangeRate;

#[derive(Debug, Clone, Error)]
pub enum ExchangeRateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested exchange rate does not exist: {0}")]
    RateDoesNotExist(String),
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}

impl From<sqlx::Error> for ExchangeRateError {
    fn from(e: sqlx::Error) -> Self {
        ExchangeRateError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait ExchangeRates {
    /// Fetch the most recent exchange rate for the given currency. If no rate has ever been set, the error
    /// [`ExchangeRateError::RateDoesNotExist`] is returned.
    async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError>;
    /// Save a new exchange rate for the given currency. Rates are append-only; the newest one wins.
    async fn set_exchange_rate(&self, rate: &ExchangeRate) -> Result<(), ExchangeRateError>;
    /// The most recent rate for every currency that has one, sorted by currency code.
    async fn fetch_latest_rates(&self) -> Result<Vec<ExchangeRate>, ExchangeRateError>;
}
