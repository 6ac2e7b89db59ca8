//! Data types that are persisted by the engine backends and passed across the public API.
use std::{fmt::Display, num::ParseIntError, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use vault_common::{CryptoAmount, UsdCents, UsdRate};

use crate::order_state;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------     Row identifiers    ------------------------------------------------------
macro_rules! row_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().trim_start_matches('#').parse::<i64>().map(Self)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

row_id!(OrderId);
row_id!(ProductId);
row_id!(CredentialId);
row_id!(AddressId);

//--------------------------------------        UserId         ---------------------------------------------------------
/// The opaque identifier the external identity provider assigns to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A buyer. May reserve products, confirm payment for and cancel their own orders.
    User,
    /// A privileged actor that verifies payments, triggers allocation and manages inventory.
    Operator,
}

pub type Roles = Vec<Role>;

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Operator => write!(f, "operator"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "operator" | "admin" => Ok(Self::Operator),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------         Actor         ---------------------------------------------------------
/// The authenticated party on whose behalf an operation is carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn buyer<U: Into<UserId>>(user_id: U) -> Self {
        Self { user_id: user_id.into(), role: Role::User }
    }

    pub fn operator<U: Into<UserId>>(user_id: U) -> Self {
        Self { user_id: user_id.into(), role: Role::Operator }
    }

    pub fn is_operator(&self) -> bool {
        self.role == Role::Operator
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.role, self.user_id)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been reserved and the buyer has not yet reported payment.
    AwaitingPayment,
    /// The buyer reports that payment has been sent.
    Paid,
    /// An operator has checked the payment.
    Verified,
    /// A credential has been bound to the order. Terminal.
    Released,
    /// The order was abandoned by the buyer or annulled by an operator. Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Cancelled)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::AwaitingPayment | Self::Paid | Self::Verified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::Paid => "paid",
            Self::Verified => "verified",
            Self::Released => "released",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to AwaitingPayment");
            OrderStatusType::AwaitingPayment
        })
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "paid" => Ok(Self::Paid),
            "verified" => Ok(Self::Verified),
            "released" => Ok(Self::Released),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------     ProductStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    Unavailable,
}

impl Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Available => write!(f, "available"),
            ProductStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl FromStr for ProductStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            s => Err(ConversionError(format!("Invalid product status: {s}"))),
        }
    }
}

//--------------------------------------   CredentialStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Available,
    Released,
}

impl Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStatus::Available => write!(f, "available"),
            CredentialStatus::Released => write!(f, "released"),
        }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub price_usd: UsdCents,
    pub stock: i64,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A product can be reserved when it is listed as available and has stock on hand.
    pub fn is_reservable(&self) -> bool {
        self.status == ProductStatus::Available && self.stock > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price_usd: UsdCents,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_product_status")]
    pub status: ProductStatus,
}

fn default_product_status() -> ProductStatus {
    ProductStatus::Available
}

impl NewProduct {
    pub fn new<S: Into<String>>(title: S, price_usd: UsdCents) -> Self {
        Self { title: title.into(), description: None, price_usd, stock: 0, status: ProductStatus::Available }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_usd: Option<UsdCents>,
    pub stock: Option<i64>,
    pub status: Option<ProductStatus>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price_usd.is_none()
            && self.stock.is_none()
            && self.status.is_none()
    }

    pub fn with_price(mut self, price: UsdCents) -> Self {
        self.price_usd = Some(price);
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub currency: String,
    pub total_usd: UsdCents,
    pub amount_crypto: CryptoAmount,
    pub deposit_address_id: Option<AddressId>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub reserved_until: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        order_state::is_expired(self.status, self.reserved_until, now)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub product_id: ProductId,
    /// The settlement currency code, e.g. `BTC`
    pub currency: String,
    /// The product price at the time of reservation
    pub total_usd: UsdCents,
    /// `total_usd` converted at the spot rate when the reservation was made. Never recalculated.
    pub amount_crypto: CryptoAmount,
    /// The address the buyer was shown for payment, if one was configured for the currency
    pub deposit_address_id: Option<AddressId>,
    pub created_at: DateTime<Utc>,
    /// Always `created_at` plus the reservation window
    pub reserved_until: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        user_id: UserId,
        product_id: ProductId,
        currency: String,
        total_usd: UsdCents,
        amount_crypto: CryptoAmount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            product_id,
            currency,
            total_usd,
            amount_crypto,
            deposit_address_id: None,
            created_at,
            reserved_until: order_state::reservation_deadline(created_at),
        }
    }

    pub fn with_deposit_address(mut self, address_id: AddressId) -> Self {
        self.deposit_address_id = Some(address_id);
        self
    }
}

//--------------------------------------      Credential       ---------------------------------------------------------
#[derive(Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub product_id: ProductId,
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
    pub status: CredentialStatus,
    pub assigned_order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("product_id", &self.product_id)
            .field("username", &self.username)
            .field("password", &"****")
            .field("status", &self.status)
            .field("assigned_order_id", &self.assigned_order_id)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct NewCredential {
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
}

impl NewCredential {
    pub fn new<S: Into<String>>(username: S, password: S) -> Self {
        Self { username: username.into(), password: password.into(), notes: None }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl std::fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NewCredential({}, ****)", self.username)
    }
}

//--------------------------------------    DepositAddress     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DepositAddress {
    pub id: AddressId,
    pub currency: String,
    pub network: Option<String>,
    pub address: String,
    pub label: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDepositAddress {
    pub currency: String,
    pub network: Option<String>,
    pub address: String,
    pub label: Option<String>,
}

impl NewDepositAddress {
    pub fn new<S: Into<String>>(currency: S, address: S) -> Self {
        Self { currency: currency.into(), network: None, address: address.into(), label: None }
    }

    pub fn with_network<S: Into<String>>(mut self, network: S) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }
}

//--------------------------------------      AuditEntry       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub target_type: String,
    pub target_id: i64,
    /// A JSON document with action-specific details
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}
