//! Tool registry.
//!
//! Maps tool names to their description, input schema, and handler. The
//! registry is built once at startup by [`crate::tools::build_registry`] and
//! is immutable afterwards, so lookups take no lock. Registration order is
//! preserved for tool listings.

use crate::db::ArangoClient;
use crate::error::{HandlerResult, RegistryError};
use crate::schema::SchemaDescriptor;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Canonical handler signature: a live database handle plus the validated,
/// normalized argument mapping.
pub type Handler =
    Arc<dyn Fn(Arc<ArangoClient>, Map<String, Value>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// One registered tool.
#[derive(Clone)]
pub struct ToolRegistration {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: SchemaDescriptor,
    pub handler: Handler,
}

impl std::fmt::Debug for ToolRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistration")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered collection of tool registrations.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    order: Vec<ToolRegistration>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A duplicate name is an error, never an overwrite.
    pub fn register(&mut self, tool: ToolRegistration) -> Result<(), RegistryError> {
        if self.index.contains_key(tool.name) {
            return Err(RegistryError::Duplicate(tool.name.to_string()));
        }
        self.index.insert(tool.name, self.order.len());
        self.order.push(tool);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolRegistration> {
        self.index.get(name).map(|&i| &self.order[i])
    }

    /// All tools in registration order.
    pub fn list_all(&self) -> &[ToolRegistration] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
