//! Configuration handling for the ArangoDB MCP Server.
//!
//! This module provides configuration management via CLI arguments and
//! environment variables. Connection settings use the `ARANGO_*` variables;
//! server behavior uses `MCP_*`.

use crate::db::ConnectionConfig;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ARANGO_URL: &str = "http://localhost:8529";
pub const DEFAULT_DATABASE: &str = "_system";
pub const DEFAULT_USERNAME: &str = "root";
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;
pub const DEFAULT_CONNECT_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_COMPAT_TOOLSET_LIMIT: usize = 7;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Which tool listing the server advertises.
///
/// `Baseline` restricts the listing to a fixed-size prefix of the registry
/// for clients that only understand the original seven core tools. Dispatch
/// is unaffected; unlisted tools still execute when called by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CompatToolset {
    /// Advertise every registered tool
    #[default]
    Full,
    /// Advertise only the first N tools in registration order
    Baseline,
}

/// Configuration for the ArangoDB MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "arango-mcp-server",
    about = "MCP server for ArangoDB - enables AI assistants to work with graph/document databases",
    version,
    author
)]
pub struct Config {
    /// ArangoDB server URL
    #[arg(long = "url", default_value = DEFAULT_ARANGO_URL, env = "ARANGO_URL")]
    pub arango_url: String,

    /// Target database name
    #[arg(long, default_value = DEFAULT_DATABASE, env = "ARANGO_DATABASE")]
    pub database: String,

    /// Username for basic authentication
    #[arg(long, default_value = DEFAULT_USERNAME, env = "ARANGO_USERNAME")]
    pub username: String,

    /// Password for basic authentication (sensitive - not logged)
    #[arg(long, default_value = "", env = "ARANGO_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Connection attempts at startup before giving up
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_RETRIES,
        env = "ARANGO_CONNECT_RETRIES"
    )]
    pub connect_retries: u32,

    /// Delay between connection attempts in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_DELAY_SECS,
        env = "ARANGO_CONNECT_DELAY"
    )]
    pub connect_delay: f64,

    /// Per-request timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS,
        env = "MCP_REQUEST_TIMEOUT"
    )]
    pub request_timeout: u64,

    /// Transport mode (stdio or http)
    #[arg(short, long, value_enum, default_value = "stdio", env = "MCP_TRANSPORT")]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "MCP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "MCP_HTTP_PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Tool listing compatibility mode (full or baseline)
    #[arg(long, value_enum, default_value = "full", env = "MCP_COMPAT_TOOLSET")]
    pub compat_toolset: CompatToolset,

    /// Number of tools advertised in baseline mode
    #[arg(
        long,
        default_value_t = DEFAULT_COMPAT_TOOLSET_LIMIT,
        env = "MCP_COMPAT_TOOLSET_LIMIT"
    )]
    pub compat_toolset_limit: usize,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            arango_url: DEFAULT_ARANGO_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: String::new(),
            connect_retries: DEFAULT_CONNECT_RETRIES,
            connect_delay: DEFAULT_CONNECT_DELAY_SECS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            compat_toolset: CompatToolset::Full,
            compat_toolset_limit: DEFAULT_COMPAT_TOOLSET_LIMIT,
        }
    }

    /// Validate the configuration, checking that the server URL parses.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.arango_url)
            .map_err(|e| format!("Invalid ArangoDB URL '{}': {e}", self.arango_url))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(format!("Unsupported URL scheme '{other}' (expected http or https)")),
        }
    }

    /// Database connection settings for the client.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.arango_url.clone(),
            database: self.database.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            request_timeout: self.request_timeout_duration(),
        }
    }

    /// Get the delay between connection attempts as a Duration.
    pub fn connect_delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.connect_delay.max(0.0))
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// The effective tool listing limit, `None` for the full toolset.
    pub fn toolset_limit(&self) -> Option<usize> {
        match self.compat_toolset {
            CompatToolset::Full => None,
            CompatToolset::Baseline => Some(self.compat_toolset_limit),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.arango_url, DEFAULT_ARANGO_URL);
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert_eq!(config.connect_retries, 3);
        assert!(config.toolset_limit().is_none());
    }

    #[test]
    fn test_validate_accepts_http_urls() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        let config = Config {
            arango_url: "ftp://localhost:8529".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_baseline_toolset_limit() {
        let config = Config {
            compat_toolset: CompatToolset::Baseline,
            ..Config::default()
        };
        assert_eq!(config.toolset_limit(), Some(7));
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_connect_delay_clamps_negative() {
        let config = Config {
            connect_delay: -1.0,
            ..Config::default()
        };
        assert_eq!(config.connect_delay_duration(), Duration::ZERO);
    }

    #[test]
    fn test_connection_config_carries_timeout() {
        let config = Config {
            request_timeout: 5,
            ..Config::default()
        };
        assert_eq!(
            config.connection_config().request_timeout,
            Duration::from_secs(5)
        );
    }
}
