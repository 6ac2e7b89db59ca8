//! # Credential vault server
//! This module hosts the HTTP server for the credential vault marketplace. It is responsible for:
//! * Authenticating callers from the access tokens minted by the identity provider.
//! * Enforcing the buyer and operator roles on each route.
//! * Translating requests into calls on the marketplace engine, and engine errors into HTTP status codes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The buyer and operator routes. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;
