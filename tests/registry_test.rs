//! Integration tests for registry population.

use arango_mcp_server::error::RegistryError;
use arango_mcp_server::registry::{ToolRegistration, ToolRegistry};
use arango_mcp_server::schema::SchemaDescriptor;
use arango_mcp_server::tools::build_registry;
use serde_json::json;
use std::sync::Arc;

/// Every tool the server ships must register, with the baseline set first.
#[test]
fn test_full_registry_builds() {
    let registry = build_registry().expect("registry must build");
    assert_eq!(registry.len(), 28);
    assert_eq!(registry.list_all()[0].name, "arango_query");
    assert_eq!(registry.list_all()[6].name, "arango_backup");
}

/// Registering the same name twice is an error and the first registration
/// stays in place.
#[test]
fn test_duplicate_registration_is_rejected() {
    let mut registry = ToolRegistry::new();

    let first = ToolRegistration {
        name: "arango_query",
        description: "first",
        schema: SchemaDescriptor::new(),
        handler: Arc::new(|_, _| Box::pin(async { Ok(json!({"which": "first"})) })),
    };
    let second = ToolRegistration {
        name: "arango_query",
        description: "second",
        schema: SchemaDescriptor::new(),
        handler: Arc::new(|_, _| Box::pin(async { Ok(json!({"which": "second"})) })),
    };

    registry.register(first).expect("first registration succeeds");
    let err = registry.register(second).expect_err("duplicate must fail");
    assert!(matches!(err, RegistryError::Duplicate(name) if name == "arango_query"));

    let kept = registry.lookup("arango_query").expect("tool still registered");
    assert_eq!(kept.description, "first");
}

/// Every registered tool carries a non-empty description and an object
/// schema suitable for the MCP tool listing.
#[test]
fn test_every_tool_has_listing_metadata() {
    let registry = build_registry().expect("registry must build");
    for tool in registry.list_all() {
        assert!(!tool.description.is_empty(), "{} has no description", tool.name);
        let schema = tool.schema.json_schema();
        assert_eq!(schema["type"], json!("object"), "{} schema is not an object", tool.name);
        assert_eq!(
            schema["additionalProperties"],
            json!(false),
            "{} schema must reject unknown fields",
            tool.name
        );
    }
}

/// Tool names follow the arango_ prefix convention without collisions.
#[test]
fn test_tool_names_are_prefixed_and_unique() {
    let registry = build_registry().expect("registry must build");
    let mut seen = std::collections::HashSet::new();
    for tool in registry.list_all() {
        assert!(tool.name.starts_with("arango_"), "unexpected name: {}", tool.name);
        assert!(seen.insert(tool.name), "duplicate name: {}", tool.name);
    }
}
