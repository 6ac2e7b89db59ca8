//! # Marketplace engine public API
//!
//! The `market_api` module exposes the programmatic API for the marketplace engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`reservation_api`] creates time-boxed reservations and assembles the checkout options for a product.
//! * [`order_flow_api`] is the order state machine. It confirms payments, cancels orders, applies operator status
//!   changes and releases credentials to paid orders.
//! * [`accounts_api`] answers buyer dashboard and operator reporting queries, including the expired reservation
//!   report.
//! * [`inventory_api`], [`address_api`] and [`exchange_rate_api`] are the operator tooling for products and
//!   credential pools, deposit addresses and spot rates respectively.
//!
//! The other submodules in this module are support types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use vault_engine::{events::EventProducers, ReservationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = ReservationApi::new(db, EventProducers::default());
//! let order = api.create_reservation(Some(&user_id), product_id, "BTC").await?;
//! ```
pub mod accounts_api;
pub mod address_api;
pub mod exchange_objects;
pub mod exchange_rate_api;
pub mod inventory_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod reservation_api;
