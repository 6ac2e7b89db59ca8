//! # Backend contracts
//!
//! This module defines the behaviour that a storage backend must expose in order to drive the marketplace engine.
//!
//! * [`MarketplaceDatabase`] is the transactional core: persisting reservations, compare-and-set status writes, and
//!   the atomic credential allocation.
//! * [`Catalog`] is read-only product lookup. [`InventoryManagement`] adds the operator-side product and credential
//!   provisioning calls.
//! * [`ExchangeRates`] stores and serves the spot rate per currency.
//! * [`AddressDirectory`] manages the deposit addresses that buyers are shown at checkout.
//! * [`AccountManagement`] answers queries about orders, released credentials and the audit trail.
mod account_management;
mod address_directory;
mod catalog;
mod data_objects;
mod exchange_rates;
mod marketplace_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use address_directory::AddressDirectory;
pub use catalog::{Catalog, InventoryManagement};
pub use data_objects::ReleasedOrder;
pub use exchange_rates::{ExchangeRateError, ExchangeRates};
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
