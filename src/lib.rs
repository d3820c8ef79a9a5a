//! ArangoDB MCP Server library.
//!
//! An MCP (Model Context Protocol) server exposing ArangoDB operations as
//! tools: AQL queries, document CRUD, index and graph management, bulk
//! operations, schema validation, and backups.
//!
//! The core pipeline is registry -> dispatcher -> handler: tools are
//! declared once with a schema and handler in [`tools::build_registry`],
//! and every call flows through [`dispatch::Dispatcher`] which validates
//! arguments, acquires a database connection, and maps errors into a
//! uniform JSON payload.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod schema;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use db::{ArangoClient, ConnectionManager};
pub use dispatch::Dispatcher;
pub use error::{DbError, DbResult};
pub use mcp::ArangoService;
pub use registry::ToolRegistry;
