//! Core data tools: AQL queries, collection listing, and document CRUD.

use crate::db::ArangoClient;
use crate::error::HandlerResult;
use crate::tools::args::{bind_vars, document_meta, not_found, opt_bool, require_object, require_str};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Execute an AQL query with optional bind vars and return the rows.
pub async fn query(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let query = require_str(&args, "query")?;
    let binds = bind_vars(&args);
    let rows = db.aql_query(query, &binds).await?;
    Ok(Value::Array(rows))
}

/// Non-system collection names.
pub async fn list_collections(db: Arc<ArangoClient>, _args: Map<String, Value>) -> HandlerResult {
    let collections = db.list_collections().await?;
    let names: Vec<Value> = collections
        .iter()
        .filter(|c| !c["isSystem"].as_bool().unwrap_or(false))
        .filter_map(|c| c.get("name").cloned())
        .collect();
    Ok(Value::Array(names))
}

pub async fn insert(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let document = require_object(&args, "document")?;
    if !db.has_collection(collection).await? {
        return Ok(not_found(collection));
    }
    let result = db
        .insert_document(collection, &Value::Object(document.clone()))
        .await?;
    Ok(document_meta(&result))
}

pub async fn update(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let key = require_str(&args, "key")?;
    let update = require_object(&args, "update")?;
    if !db.has_collection(collection).await? {
        return Ok(not_found(collection));
    }
    let result = db
        .update_document(collection, key, &Value::Object(update.clone()))
        .await?;
    Ok(document_meta(&result))
}

pub async fn remove(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let key = require_str(&args, "key")?;
    if !db.has_collection(collection).await? {
        return Ok(not_found(collection));
    }
    let result = db.remove_document(collection, key).await?;
    Ok(document_meta(&result))
}

/// Create a collection, or report the existing one's properties.
pub async fn create_collection(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let name = require_str(&args, "name")?;
    let edge = args.get("type").and_then(Value::as_str) == Some("edge");
    let wait_for_sync = opt_bool(&args, "wait_for_sync");

    if !db.has_collection(name).await? {
        db.create_collection(name, edge, wait_for_sync).await?;
    }

    let props = db.collection_properties(name).await?;
    // Collection type codes: 2 = document, 3 = edge.
    let mapped = if props["type"].as_i64() == Some(3) {
        "edge"
    } else {
        "document"
    };
    Ok(json!({
        "name": props.get("name").cloned().unwrap_or_else(|| json!(name)),
        "type": mapped,
        "waitForSync": props.get("waitForSync").cloned().unwrap_or(Value::Null),
    }))
}
