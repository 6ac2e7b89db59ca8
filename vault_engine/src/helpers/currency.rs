use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: '{0}'. Expected 2 to 10 letters or digits, e.g. BTC")]
pub struct CurrencyCodeError(pub String);

/// Trims and upper-cases a currency code. Codes are between 2 and 10 ASCII letters or digits (`BTC`, `USDT`, `ETH`).
pub fn normalize_currency(code: &str) -> Result<String, CurrencyCodeError> {
    let code = code.trim();
    let valid = (2..=10).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(CurrencyCodeError(code.to_string()))
    }
}
