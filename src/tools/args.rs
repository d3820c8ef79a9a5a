//! Argument extraction helpers for tool handlers.
//!
//! Handlers receive arguments that already passed schema validation, so a
//! missing required key here means the schema and the handler disagree.
//! That is surfaced as `HandlerError::MissingParameter` and logged loudly by
//! the dispatcher rather than papered over.

use crate::error::HandlerError;
use serde_json::{Map, Value, json};

pub fn require_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str, HandlerError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::missing(key))
}

pub fn require_object<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, HandlerError> {
    args.get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| HandlerError::missing(key))
}

pub fn require_array<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Vec<Value>, HandlerError> {
    args.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| HandlerError::missing(key))
}

pub fn opt_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub fn opt_bool(args: &Map<String, Value>, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

pub fn opt_i64(args: &Map<String, Value>, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

pub fn bool_or(args: &Map<String, Value>, key: &str, default: bool) -> bool {
    opt_bool(args, key).unwrap_or(default)
}

pub fn i64_or(args: &Map<String, Value>, key: &str, default: i64) -> i64 {
    opt_i64(args, key).unwrap_or(default)
}

/// Optional string list, empty when absent.
pub fn string_list(args: &Map<String, Value>, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// The `bind_vars` argument, empty when absent.
pub fn bind_vars(args: &Map<String, Value>) -> Map<String, Value> {
    args.get("bind_vars")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Document metadata triple returned by write operations.
pub fn document_meta(result: &Value) -> Value {
    json!({
        "_id": result.get("_id").cloned().unwrap_or(Value::Null),
        "_key": result.get("_key").cloned().unwrap_or(Value::Null),
        "_rev": result.get("_rev").cloned().unwrap_or(Value::Null),
    })
}

/// In-band report for a collection that does not exist. Part of the wire
/// contract: clients match on the `type` field.
pub fn not_found(collection: &str) -> Value {
    json!({
        "error": format!("Collection '{collection}' does not exist"),
        "type": "CollectionNotFound",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_require_str_missing_key() {
        let err = require_str(&Map::new(), "collection").unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: collection");
    }

    #[test]
    fn test_string_list_absent_is_empty() {
        assert!(string_list(&Map::new(), "fields").is_empty());
        let args = map(json!({"fields": ["a", "b"]}));
        assert_eq!(string_list(&args, "fields"), vec!["a", "b"]);
    }

    #[test]
    fn test_document_meta_extracts_triple() {
        let meta = document_meta(&json!({"_id": "users/1", "_key": "1", "_rev": "abc", "new": {}}));
        assert_eq!(meta, json!({"_id": "users/1", "_key": "1", "_rev": "abc"}));
    }
}
