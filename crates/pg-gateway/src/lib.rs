//! PostgreSQL gateway for pg2json.
//!
//! This crate provides:
//! - [`ConnectionParameters`] and [`TableDescriptor`] models
//! - [`compile_query`]: turns a [`QuerySpec`] into one JSON-aggregating
//!   `SELECT`
//! - [`classify`]: maps connect-time failures onto [`ConnectionErrorKind`]
//! - [`RelationalGateway`] / [`GatewayClient`]: connect, list tables, run
//!   queries, close; [`PostgresGateway`] is the production implementation
//!
//! Every successful `connect` hands back a client that must be closed exactly
//! once. `GatewayClient::close` consumes the client, so a second close does
//! not compile.

mod classify;
mod error;
mod models;
mod postgres;
mod query;
mod rows;
mod traits;

pub use classify::{classify, ConnectFailure, ConnectionErrorKind};
pub use error::{GatewayError, GatewayResult, ValidationError};
pub use models::{ConnectionParameters, TableDescriptor, DEFAULT_SCHEMA};
pub use postgres::{PostgresClient, PostgresGateway, DEFAULT_CONNECT_TIMEOUT};
pub use query::{compile_query, QuerySpec};
pub use rows::JsonText;
pub use traits::{GatewayClient, RelationalGateway};
