//! Database layer: the ArangoDB HTTP client and shared connection management.

pub mod client;
pub mod connection;

pub use client::{ArangoClient, ConnectionConfig};
pub use connection::ConnectionManager;
