use sqlx::SqliteConnection;

use crate::{market_api::exchange_objects::ExchangeRate, traits::ExchangeRateError};

pub async fn fetch_last_rate(currency: &str, conn: &mut SqliteConnection) -> Result<ExchangeRate, ExchangeRateError> {
    let result = sqlx::query_as(
        r#"SELECT currency, rate_usd, updated_by, updated_at
        FROM exchange_rates WHERE currency = $1 ORDER BY id DESC LIMIT 1"#,
    )
    .bind(currency)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ExchangeRateError::RateDoesNotExist(currency.to_string()))?;
    Ok(result)
}

pub async fn set_exchange_rate(rate: &ExchangeRate, conn: &mut SqliteConnection) -> Result<(), ExchangeRateError> {
    sqlx::query(r#"INSERT INTO exchange_rates (currency, rate_usd, updated_by, updated_at) VALUES ($1, $2, $3, $4)"#)
        .bind(&rate.currency)
        .bind(rate.rate_usd)
        .bind(&rate.updated_by)
        .bind(rate.updated_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_latest_rates(conn: &mut SqliteConnection) -> Result<Vec<ExchangeRate>, ExchangeRateError> {
    let rates = sqlx::query_as(
        r#"SELECT currency, rate_usd, updated_by, updated_at FROM exchange_rates r
        WHERE id = (SELECT MAX(id) FROM exchange_rates WHERE currency = r.currency)
        ORDER BY currency ASC"#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rates)
}
