//! MCP server integration module.
//!
//! Bridges the MCP protocol (via rmcp) to the tool registry and dispatcher.

pub mod service;

pub use service::ArangoService;
