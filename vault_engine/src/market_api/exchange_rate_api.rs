//! Spot rates per settlement currency. Rates are entered by an operator; there is no live price feed.

use std::fmt::Debug;

use log::info;
use vault_common::UsdRate;

use crate::{
    db_types::Actor,
    helpers::normalize_currency,
    market_api::exchange_objects::ExchangeRate,
    traits::{ExchangeRateError, ExchangeRates},
};

pub struct ExchangeRateApi<B> {
    db: B,
}

impl<B> Debug for ExchangeRateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExchangeRateApi")
    }
}

impl<B> ExchangeRateApi<B>
where B: ExchangeRates
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_last_rate(&self, currency: &str) -> Result<ExchangeRate, ExchangeRateError> {
        let currency = normalize_currency(currency).map_err(|e| ExchangeRateError::InvalidRate(e.to_string()))?;
        self.db.fetch_last_rate(&currency).await
    }

    /// Records a new rate for `currency`. The new rate applies to reservations made from now on. Existing orders keep
    /// the amount they were created with.
    pub async fn set_exchange_rate(
        &self,
        currency: &str,
        rate: UsdRate,
        actor: &Actor,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        let currency = normalize_currency(currency).map_err(|e| ExchangeRateError::InvalidRate(e.to_string()))?;
        if !rate.is_valid() {
            return Err(ExchangeRateError::InvalidRate(format!("{currency} rate must be positive, got {rate}")));
        }
        let rate = ExchangeRate::new(currency, rate, None).with_updated_by(actor.user_id.as_str());
        self.db.set_exchange_rate(&rate).await?;
        info!("🪛️ {actor} set the exchange rate: {rate}");
        Ok(rate)
    }

    pub async fn fetch_latest_rates(&self) -> Result<Vec<ExchangeRate>, ExchangeRateError> {
        self.db.fetch_latest_rates().await
    }
}
