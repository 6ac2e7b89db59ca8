//! Credential Vault marketplace engine
//!
//! The marketplace sells pre-provisioned account credentials for cryptocurrency. A buyer reserves a product and is
//! shown a deposit address, a fixed crypto amount and a 15-minute payment window. Once an operator has confirmed the
//! payment, a credential from the product's pool is bound to the order, exclusively and exactly once.
//!
//! This library contains the core logic of the marketplace. It is divided into these sections:
//! 1. The data types that are persisted and passed across the API ([`mod@db_types`]).
//! 2. The backend contracts ([`mod@traits`]) and their SQLite implementation, [`SqliteDatabase`]. You should never need
//!    to access the database directly. Instead, use the public API provided by the engine.
//! 3. The order lifecycle rules ([`mod@order_state`]): the transition table and the expiry predicate.
//! 4. The engine public API ([`mod@market_api`]): reservations, the order state machine, credential release, and the
//!    operator tooling around them.
//!
//! The engine also emits events that can be subscribed to. For example, when a credential is released, an
//! `OrderReleasedEvent` is emitted. See [`mod@events`] for how to hook into these.
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod market_api;
pub mod order_state;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use market_api::{
    accounts_api::AccountApi,
    address_api::AddressApi,
    exchange_rate_api::ExchangeRateApi,
    inventory_api::InventoryApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    reservation_api::ReservationApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    AccountManagement,
    AddressDirectory,
    Catalog,
    ExchangeRateError,
    ExchangeRates,
    InventoryManagement,
    MarketplaceDatabase,
    MarketplaceError,
    ReleasedOrder,
};
