mod currency;

pub use currency::{normalize_currency, CurrencyCodeError};
