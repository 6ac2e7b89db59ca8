use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vault_common::{CryptoAmount, MoneyConversionError, UsdCents, UsdRate};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Upper-case currency code, e.g. `BTC`
    pub currency: String,
    /// The USD price of one whole coin, in units of 1e-12 USD
    pub rate_usd: UsdRate,
    /// The operator that recorded the rate, if known
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(currency: String, rate_usd: UsdRate, updated_at: Option<DateTime<Utc>>) -> Self {
        let updated_at = updated_at.unwrap_or_else(Utc::now);
        Self { currency, rate_usd, updated_by: None, updated_at }
    }

    pub fn with_updated_by<S: Into<String>>(mut self, user: S) -> Self {
        self.updated_by = Some(user.into());
        self
    }

    /// The crypto amount payable for `price` at this rate, rounded to 8 decimal places.
    pub fn convert(&self, price: UsdCents) -> Result<CryptoAmount, MoneyConversionError> {
        self.rate_usd.convert(price)
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1 {} => {}", self.currency, self.rate_usd)
    }
}
