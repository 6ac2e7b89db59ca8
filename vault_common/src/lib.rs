mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{CryptoAmount, MoneyConversionError, UsdCents, UsdRate, CRYPTO_DECIMALS};
pub use secret::Secret;
