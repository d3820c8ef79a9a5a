//! MCP service implementation using rmcp.
//!
//! `ArangoService` implements `ServerHandler` directly rather than through
//! the macro router: the tool listing is generated from the registry, and
//! `call_tool` delegates to the dispatcher. Every call returns a single JSON
//! text content; clients distinguish success from failure by the presence of
//! an `"error"` field in the payload, not by the MCP error channel.

use crate::dispatch::Dispatcher;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ArangoService {
    dispatcher: Arc<Dispatcher>,
    /// When set, the tool listing is truncated to this many tools, in
    /// registration order. Used by the baseline compatibility toolset.
    toolset_limit: Option<usize>,
}

impl ArangoService {
    pub fn new(dispatcher: Arc<Dispatcher>, toolset_limit: Option<usize>) -> Self {
        Self {
            dispatcher,
            toolset_limit,
        }
    }

    /// The tool listing in registration order, truncated when a compat
    /// toolset limit is configured.
    pub fn tool_listing(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self
            .dispatcher
            .registry()
            .list_all()
            .iter()
            .map(|t| Tool::new(t.name, t.description, Arc::new(t.schema.json_schema())))
            .collect();
        if let Some(limit) = self.toolset_limit {
            tools.truncate(limit);
        }
        tools
    }
}

impl ServerHandler for ArangoService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "arango-mcp-server".to_owned(),
                title: Some("ArangoDB MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "ArangoDB tools for document, graph, and AQL operations.\n\
                \n\
                ## Workflow\n\
                1. Call `arango_list_collections` to discover collections\n\
                2. Use `arango_query` for AQL, or the typed tools for CRUD\n\
                3. Graph tools accept either a named graph or explicit edge collections\n\
                \n\
                Tool results are JSON; a payload with an `error` field indicates failure."
                    .to_owned(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                meta: None,
                tools: self.tool_listing(),
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let raw = request.arguments.unwrap_or_default();
            let payload = self.dispatcher.dispatch(&request.name, raw).await.into_value();
            let text = serde_json::to_string(&payload)
                .map_err(|e| McpError::internal_error(format!("Unserializable result: {e}"), None))?;
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ArangoClient, ConnectionConfig, ConnectionManager};
    use crate::tools::build_registry;
    use std::time::Duration;

    fn test_service(toolset_limit: Option<usize>) -> ArangoService {
        let config = ConnectionConfig {
            url: "http://127.0.0.1:1".to_string(),
            database: "_system".to_string(),
            username: "root".to_string(),
            password: String::new(),
            request_timeout: Duration::from_millis(200),
        };
        let client = Arc::new(ArangoClient::new(&config).unwrap());
        let connections = Arc::new(ConnectionManager::with_handle(config, client));
        let registry = Arc::new(build_registry().unwrap());
        ArangoService::new(Arc::new(Dispatcher::new(registry, connections)), toolset_limit)
    }

    #[test]
    fn test_full_listing_exposes_every_tool() {
        let service = test_service(None);
        assert_eq!(service.tool_listing().len(), 28);
    }

    #[test]
    fn test_baseline_listing_is_first_seven() {
        let service = test_service(Some(7));
        let names: Vec<String> = service
            .tool_listing()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "arango_query",
                "arango_list_collections",
                "arango_insert",
                "arango_update",
                "arango_remove",
                "arango_create_collection",
                "arango_backup",
            ]
        );
    }

    #[test]
    fn test_listing_carries_input_schemas() {
        let service = test_service(None);
        let listing = service.tool_listing();
        let insert = listing.iter().find(|t| t.name == "arango_insert").unwrap();
        let schema = serde_json::to_value(insert.input_schema.as_ref()).unwrap();
        assert_eq!(schema["type"], serde_json::json!("object"));
        assert!(schema["properties"]["collection"].is_object());
    }

    #[test]
    fn test_get_info_enables_tools() {
        let service = test_service(None);
        let info = service.get_info();
        assert!(info.capabilities.tools.is_some());
    }
}
