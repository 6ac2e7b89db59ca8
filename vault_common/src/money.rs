use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of decimal places that crypto amounts are quoted to.
pub const CRYPTO_DECIMALS: u32 = 8;

const CENT_DECIMALS: u32 = 2;
const RATE_DECIMALS: u32 = 12;
const RATE_SCALE: i64 = 1_000_000_000_000;
/// cents -> 1e-8 coin units, given a rate in units of 1e-12 USD: 10^8 * 10^12 / 10^2
const CONVERSION_SCALE: i128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as a fixed-point amount: {0}")]
pub struct MoneyConversionError(String);

//--------------------------------------      UsdCents       ---------------------------------------------------------
/// A US dollar amount, held in cents.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UsdCents(i64);

op!(binary UsdCents, Add, add);
op!(binary UsdCents, Sub, sub);
op!(inplace UsdCents, AddAssign, add_assign);
op!(inplace UsdCents, SubAssign, sub_assign);
op!(unary UsdCents, Neg, neg);

impl Sum for UsdCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for UsdCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl UsdCents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Display for UsdCents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", format_fixed(self.0, CENT_DECIMALS))
    }
}

impl FromStr for UsdCents {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('$').unwrap_or(s);
        parse_fixed(s, CENT_DECIMALS).map(Self)
    }
}

//--------------------------------------    CryptoAmount     ---------------------------------------------------------
/// A cryptocurrency amount in units of 10^-8 of a whole coin, which is the precision order amounts are quoted to.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct CryptoAmount(i64);

op!(binary CryptoAmount, Add, add);
op!(binary CryptoAmount, Sub, sub);

impl From<i64> for CryptoAmount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl CryptoAmount {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Display for CryptoAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_fixed(self.0, CRYPTO_DECIMALS))
    }
}

impl FromStr for CryptoAmount {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s.trim(), CRYPTO_DECIMALS).map(Self)
    }
}

//--------------------------------------       UsdRate       ---------------------------------------------------------
/// The USD price of one whole coin, in units of 10^-12 USD.
///
/// The fine scale lets sub-cent tokens be priced exactly (e.g. `0.0000125`). The largest representable rate is a
/// little over $9.2 million per coin.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UsdRate(i64);

impl From<i64> for UsdRate {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl UsdRate {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_dollars(dollars: i64) -> Self {
        Self(dollars.saturating_mul(RATE_SCALE))
    }

    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }

    /// Converts a USD price into the crypto amount payable at this rate, rounded half-up to 8 decimal places.
    ///
    /// The result satisfies `|amount * rate - price| <= rate * 0.5e-8`.
    pub fn convert(&self, price: UsdCents) -> Result<CryptoAmount, MoneyConversionError> {
        if !self.is_valid() {
            return Err(MoneyConversionError(format!("{self} is not a usable exchange rate")));
        }
        if price.value() < 0 {
            return Err(MoneyConversionError(format!("Cannot convert a negative price ({price})")));
        }
        let rate = i128::from(self.0);
        let scaled = i128::from(price.value()) * CONVERSION_SCALE;
        let units = (2 * scaled + rate) / (2 * rate);
        i64::try_from(units)
            .map(CryptoAmount)
            .map_err(|_| MoneyConversionError(format!("{price} at {self} overflows the crypto amount range")))
    }
}

impl Display for UsdRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let full = format_fixed(self.0, RATE_DECIMALS);
        // Show at least cents, and no trailing zeros beyond that
        let (whole, frac) = full.split_once('.').unwrap_or((full.as_str(), ""));
        let frac = frac.trim_end_matches('0');
        write!(f, "${whole}.{frac:0<2}")
    }
}

impl FromStr for UsdRate {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('$').unwrap_or(s);
        parse_fixed(s, RATE_DECIMALS).map(Self)
    }
}

//--------------------------------------  fixed point helpers ---------------------------------------------------------
fn format_fixed(value: i64, decimals: u32) -> String {
    let scale = 10u64.pow(decimals);
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let width = decimals as usize;
    format!("{sign}{}.{:0width$}", abs / scale, abs % scale)
}

fn parse_fixed(s: &str, decimals: u32) -> Result<i64, MoneyConversionError> {
    let err = || MoneyConversionError(format!("'{s}' is not a decimal with at most {decimals} places"));
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(err());
    }
    if frac.len() > decimals as usize {
        return Err(err());
    }
    let whole = if whole.is_empty() { 0 } else { whole.parse::<i64>().map_err(|_| err())? };
    let padded = format!("{frac:0<width$}", width = decimals as usize);
    let frac = if padded.is_empty() { 0 } else { padded.parse::<i64>().map_err(|_| err())? };
    let value = whole.checked_mul(10i64.pow(decimals)).and_then(|w| w.checked_add(frac)).ok_or_else(err)?;
    Ok(if negative { -value } else { value })
}
