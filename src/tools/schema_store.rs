//! Stored JSON Schema management and document validation.
//!
//! Schemas live in a dedicated `mcp_schemas` collection, keyed
//! `<collection>:<name>`, and are draft-07 documents compiled with the
//! `jsonschema` crate. This validation applies to user documents only; tool
//! arguments are validated by `SchemaDescriptor`.

use crate::db::ArangoClient;
use crate::error::{HandlerError, HandlerResult};
use crate::tools::args::{opt_str, require_object, require_str};
use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Collection holding stored schemas.
const SCHEMA_COLLECTION: &str = "mcp_schemas";

fn schema_key(collection: &str, name: &str) -> String {
    format!("{collection}:{name}")
}

fn compile(schema: &Value) -> Result<JSONSchema, String> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| e.to_string())
}

/// Store (or replace) a named schema for a collection.
pub async fn create_schema(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let name = require_str(&args, "name")?;
    let collection = require_str(&args, "collection")?;
    let schema = Value::Object(require_object(&args, "schema_def")?.clone());

    compile(&schema).map_err(|e| HandlerError::invalid(format!("Invalid JSON Schema: {e}")))?;

    if !db.has_collection(SCHEMA_COLLECTION).await? {
        db.create_collection(SCHEMA_COLLECTION, false, None).await?;
    }
    let key = schema_key(collection, name);
    let doc = json!({
        "_key": key,
        "collection": collection,
        "name": name,
        "schema": schema,
    });
    db.upsert_document(SCHEMA_COLLECTION, &doc).await?;
    Ok(json!({"created": true, "key": key}))
}

/// Validate a document against an inline or stored schema.
pub async fn validate_document(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let document = Value::Object(require_object(&args, "document")?.clone());

    let schema = match args.get("schema_def").and_then(Value::as_object) {
        Some(inline) => Value::Object(inline.clone()),
        None => {
            let Some(schema_name) = opt_str(&args, "schema_name") else {
                return Err(HandlerError::invalid(
                    "Either 'schema' or 'schema_name' must be provided",
                ));
            };
            let key = schema_key(collection, schema_name);
            if !db.has_collection(SCHEMA_COLLECTION).await? {
                return Err(HandlerError::invalid(format!(
                    "No stored schemas found (collection '{SCHEMA_COLLECTION}' missing)"
                )));
            }
            let stored = db
                .get_document(SCHEMA_COLLECTION, &key)
                .await?
                .ok_or_else(|| HandlerError::invalid(format!("Stored schema not found: {key}")))?;
            stored.get("schema").cloned().unwrap_or(Value::Null)
        }
    };

    let compiled = match compile(&schema) {
        Ok(compiled) => compiled,
        Err(e) => {
            return Ok(json!({
                "valid": false,
                "errors": [{"message": format!("Invalid schema: {e}")}],
            }));
        }
    };

    match compiled.validate(&document) {
        Ok(()) => Ok(json!({"valid": true})),
        Err(errors) => {
            let details: Vec<Value> = errors
                .map(|e| {
                    json!({
                        "message": e.to_string(),
                        "path": e.instance_path.to_string(),
                    })
                })
                .collect();
            Ok(json!({"valid": false, "errors": details}))
        }
    }
}
