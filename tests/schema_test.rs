//! Integration tests for argument schemas as the tools actually declare them.
//!
//! These tests run real tool schemas from the registry through validation,
//! covering normalization (defaults and aliases) and rejection shapes.

use arango_mcp_server::tools::build_registry;
use serde_json::{Map, Value, json};

fn schema_for(name: &str) -> arango_mcp_server::schema::SchemaDescriptor {
    let registry = build_registry().expect("registry must build");
    registry
        .lookup(name)
        .unwrap_or_else(|| panic!("tool {name} not registered"))
        .schema
        .clone()
}

fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("test args must be an object")
}

/// Optional fields with declared defaults are filled in before the handler
/// runs, so handlers never re-derive them.
#[test]
fn test_defaults_are_normalized_in() {
    let schema = schema_for("arango_create_collection");
    let args = schema
        .validate(&obj(json!({"name": "users"})))
        .expect("valid args");
    assert_eq!(args["type"], json!("document"));
}

/// Camel-case aliases from older clients resolve onto the canonical key,
/// and the alias wins when both spellings are present.
#[test]
fn test_alias_resolves_to_canonical_key() {
    let schema = schema_for("arango_create_collection");

    let args = schema
        .validate(&obj(json!({"name": "users", "waitForSync": true})))
        .expect("aliased args validate");
    assert_eq!(args["wait_for_sync"], json!(true));
    assert!(!args.contains_key("waitForSync"));

    let args = schema
        .validate(&obj(json!({
            "name": "users",
            "waitForSync": true,
            "wait_for_sync": false
        })))
        .expect("both spellings validate");
    assert_eq!(args["wait_for_sync"], json!(true));
}

/// Enum-constrained fields reject values outside the declared set.
#[test]
fn test_enum_constraint_is_enforced() {
    let schema = schema_for("arango_create_collection");
    let violations = schema
        .validate(&obj(json!({"name": "users", "type": "vertex"})))
        .expect_err("bad enum must fail");
    assert!(violations.iter().any(|v| v.field == "type" && v.code == "enum"));
}

/// Object-array elements validate recursively with field paths pointing at
/// the offending element.
#[test]
fn test_nested_element_violations_carry_paths() {
    let schema = schema_for("arango_create_graph");
    let violations = schema
        .validate(&obj(json!({
            "name": "social",
            "edge_definitions": [
                {
                    "edge_collection": "knows",
                    "from_collections": ["people"],
                    "to_collections": ["people"]
                },
                {"edge_collection": "likes"}
            ]
        })))
        .expect_err("incomplete edge definition must fail");
    assert!(
        violations
            .iter()
            .any(|v| v.field.contains("edge_definitions[1]")),
        "expected a violation inside element 1, got: {violations:?}"
    );
}

/// A null argument counts as absent: required fields still fail, optional
/// fields fall back to their defaults.
#[test]
fn test_null_is_treated_as_absent() {
    let schema = schema_for("arango_query");
    let violations = schema
        .validate(&obj(json!({"query": null})))
        .expect_err("null required field must fail");
    assert!(violations.iter().any(|v| v.field == "query" && v.code == "missing"));

    let schema = schema_for("arango_create_collection");
    let args = schema
        .validate(&obj(json!({"name": "users", "type": null})))
        .expect("null optional field validates");
    assert_eq!(args["type"], json!("document"));
}
