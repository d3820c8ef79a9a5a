//! Tool dispatch.
//!
//! The dispatcher is the single boundary where tool calls enter the server:
//! lookup, argument validation, handle acquisition, handler invocation, and
//! error mapping all happen here. Handlers themselves only return
//! `HandlerError`; the conversion into wire failure kinds is concentrated in
//! this module so the envelope stays uniform across every tool.
//!
//! Every failure is recovered: a failing handler produces a `Failure` result
//! and the dispatch loop keeps serving subsequent calls.

use crate::db::ConnectionManager;
use crate::error::{ErrorKind, HandlerError};
use crate::registry::ToolRegistry;
use crate::schema::Violation;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outcome of one tool call, prior to serialization.
#[derive(Debug)]
pub enum DispatchResult {
    /// The handler's payload, returned verbatim.
    Success(Value),
    Failure {
        kind: ErrorKind,
        message: String,
        /// Tool name, when the call got past lookup.
        tool: Option<String>,
        /// Per-field violations for `ValidationError`.
        details: Vec<Violation>,
        /// Operator hint for `DatabaseUnavailable`.
        hint: Option<String>,
    },
}

impl DispatchResult {
    fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
            tool: None,
            details: Vec::new(),
            hint: None,
        }
    }

    fn for_tool(mut self, name: &str) -> Self {
        if let Self::Failure { tool, .. } = &mut self {
            *tool = Some(name.to_string());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Serialize into the wire payload.
    ///
    /// Successes pass through verbatim. Failures carry an `"error"` field,
    /// which is the only marker clients use to tell the two apart.
    pub fn into_value(self) -> Value {
        match self {
            Self::Success(value) => value,
            Self::Failure {
                kind,
                message,
                tool,
                details,
                hint,
            } => {
                let mut payload = Map::new();
                payload.insert("error".to_string(), json!(message));
                payload.insert("type".to_string(), json!(kind.as_str()));
                if let Some(tool) = tool {
                    payload.insert("tool".to_string(), json!(tool));
                }
                if !details.is_empty() {
                    payload.insert("details".to_string(), json!(details));
                }
                if let Some(hint) = hint {
                    payload.insert("hint".to_string(), json!(hint));
                }
                Value::Object(payload)
            }
        }
    }
}

/// Routes tool calls from the wire surface to their handlers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    connections: Arc<ConnectionManager>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, connections: Arc<ConnectionManager>) -> Self {
        Self {
            registry,
            connections,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Execute one tool call end to end.
    pub async fn dispatch(&self, name: &str, raw: Map<String, Value>) -> DispatchResult {
        let Some(tool) = self.registry.lookup(name) else {
            warn!(tool = %name, "Unknown tool requested");
            return DispatchResult::failure(ErrorKind::UnknownTool, format!("Unknown tool: {name}"));
        };

        let args = match tool.schema.validate(&raw) {
            Ok(args) => args,
            Err(violations) => {
                debug!(tool = %name, violations = violations.len(), "Argument validation failed");
                return DispatchResult::Failure {
                    kind: ErrorKind::ValidationError,
                    message: "ValidationError".to_string(),
                    tool: Some(name.to_string()),
                    details: violations,
                    hint: None,
                };
            }
        };

        let handle = match self.connections.acquire().await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(tool = %name, error = %err, "No database connection for tool call");
                return DispatchResult::Failure {
                    kind: ErrorKind::DatabaseUnavailable,
                    message: "Database unavailable".to_string(),
                    tool: Some(name.to_string()),
                    details: Vec::new(),
                    hint: Some(
                        "Check that ArangoDB is running and the connection settings are correct"
                            .to_string(),
                    ),
                };
            }
        };

        match (tool.handler)(handle, args).await {
            Ok(value) => DispatchResult::Success(value),
            Err(err) => self.map_handler_error(name, err),
        }
    }

    fn map_handler_error(&self, name: &str, err: HandlerError) -> DispatchResult {
        let kind = match &err {
            // Validated arguments lacked a key the handler needs; the
            // schema and handler disagree, which is a server bug.
            HandlerError::MissingParameter(param) => {
                error!(tool = %name, parameter = %param, "Schema/handler contract mismatch");
                ErrorKind::MissingParameter
            }
            HandlerError::Database(_) => ErrorKind::DatabaseOperationFailed,
            HandlerError::Invalid(_) => ErrorKind::DatabaseOperationFailed,
            HandlerError::Unexpected(_) => ErrorKind::UnexpectedError,
        };
        warn!(tool = %name, kind = %kind, error = %err, "Tool call failed");
        DispatchResult::failure(kind, err.to_string()).for_tool(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ArangoClient, ConnectionConfig};
    use crate::registry::ToolRegistration;
    use crate::schema::{FieldKind, FieldSpec, SchemaDescriptor};
    use std::time::Duration;

    fn test_connections() -> Arc<ConnectionManager> {
        let config = ConnectionConfig {
            url: "http://127.0.0.1:1".to_string(),
            database: "_system".to_string(),
            username: "root".to_string(),
            password: String::new(),
            request_timeout: Duration::from_millis(200),
        };
        let client = Arc::new(ArangoClient::new(&config).unwrap());
        Arc::new(ConnectionManager::with_handle(config, client))
    }

    fn disconnected_connections() -> Arc<ConnectionManager> {
        let config = ConnectionConfig {
            url: "http://127.0.0.1:1".to_string(),
            database: "_system".to_string(),
            username: "root".to_string(),
            password: String::new(),
            request_timeout: Duration::from_millis(200),
        };
        Arc::new(ConnectionManager::new(config))
    }

    fn ping_registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolRegistration {
                name: "ping",
                description: "Echo back the arguments",
                schema: SchemaDescriptor::new()
                    .field(FieldSpec::optional("payload", FieldKind::Any)),
                handler: Arc::new(|_, args| Box::pin(async move { Ok(json!(args)) })),
            })
            .unwrap();
        registry
            .register(ToolRegistration {
                name: "always_fails",
                description: "Fails on every call",
                schema: SchemaDescriptor::new(),
                handler: Arc::new(|_, _| {
                    Box::pin(async { Err(HandlerError::unexpected("boom")) })
                }),
            })
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_ping_returns_payload_verbatim() {
        let dispatcher = Dispatcher::new(ping_registry(), test_connections());
        let raw = json!({"payload": {"n": 42}}).as_object().cloned().unwrap();
        let result = dispatcher.dispatch("ping", raw).await;
        assert_eq!(result.into_value(), json!({"payload": {"n": 42}}));
    }

    #[tokio::test]
    async fn test_unknown_tool_message_and_isolation() {
        let connections = test_connections();
        let dispatcher = Dispatcher::new(ping_registry(), Arc::clone(&connections));
        let result = dispatcher.dispatch("arango_qury", Map::new()).await;
        let payload = result.into_value();
        assert_eq!(payload["error"], json!("Unknown tool: arango_qury"));
        assert_eq!(payload["type"], json!("UnknownTool"));
        // Lookup failure never touches the connection manager.
        assert_eq!(connections.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_handler() {
        let mut registry = ToolRegistry::new();
        let invoked = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        registry
            .register(ToolRegistration {
                name: "arango_insert",
                description: "Insert a document",
                schema: SchemaDescriptor::new()
                    .field(FieldSpec::required("collection", FieldKind::String))
                    .field(FieldSpec::required("document", FieldKind::Object)),
                handler: Arc::new(move |_, _| {
                    flag.store(true, std::sync::atomic::Ordering::SeqCst);
                    Box::pin(async { Ok(json!({})) })
                }),
            })
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry), test_connections());

        let raw = json!({"document": {"name": "x"}}).as_object().cloned().unwrap();
        let payload = dispatcher.dispatch("arango_insert", raw).await.into_value();

        assert_eq!(payload["type"], json!("ValidationError"));
        assert_eq!(payload["tool"], json!("arango_insert"));
        let details = payload["details"].as_array().unwrap();
        assert!(details.iter().any(|d| d["field"] == json!("collection")));
        assert!(!invoked.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unreachable_database_yields_unavailable() {
        let connections = disconnected_connections();
        let dispatcher = Dispatcher::new(ping_registry(), Arc::clone(&connections));
        let payload = dispatcher.dispatch("ping", Map::new()).await.into_value();
        assert_eq!(payload["error"], json!("Database unavailable"));
        assert_eq!(payload["type"], json!("DatabaseUnavailable"));
        assert!(payload["hint"].is_string());
        // Exactly one lazy reconnect attempt per dispatch.
        assert_eq!(connections.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_handler_failure_leaves_dispatcher_usable() {
        let dispatcher = Dispatcher::new(ping_registry(), test_connections());
        let payload = dispatcher.dispatch("always_fails", Map::new()).await.into_value();
        assert_eq!(payload["type"], json!("UnexpectedError"));

        let raw = json!({"payload": 1}).as_object().cloned().unwrap();
        let result = dispatcher.dispatch("ping", raw).await;
        assert!(result.is_success());
    }

    #[test]
    fn test_success_payload_passes_through() {
        let result = DispatchResult::Success(json!({"inserted": true}));
        assert_eq!(result.into_value(), json!({"inserted": true}));
    }
}
