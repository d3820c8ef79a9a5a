//! Reference validation and bulk write tools.

use crate::db::ArangoClient;
use crate::error::HandlerResult;
use crate::tools::args::{bool_or, document_meta, i64_or, opt_str, require_array, require_object, require_str, string_list};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Cap on invalid documents echoed back in a validation report.
const INVALID_REPORT_LIMIT: usize = 100;

/// Find documents whose reference fields point at missing documents.
pub async fn validate_references(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let ref_fields = string_list(&args, "reference_fields");

    let query = "
        FOR doc IN @@col
          LET invalid_refs = (
            FOR field IN @fields
              LET ref = DOCUMENT(doc[field])
              FILTER ref == null AND doc[field] != null
              RETURN {field: field, value: doc[field]}
          )
          FILTER LENGTH(invalid_refs) > 0
          RETURN { _id: doc._id, _key: doc._key, invalid_references: invalid_refs }
    ";
    let mut binds = Map::new();
    binds.insert("@col".to_string(), json!(collection));
    binds.insert("fields".to_string(), json!(ref_fields));
    let invalid_docs = db.aql_query(query, &binds).await?;

    let total_checked = db.collection_count(collection).await?;
    let mut result = json!({
        "total_checked": total_checked,
        "invalid_count": invalid_docs.len(),
        "invalid_documents": invalid_docs.iter().take(INVALID_REPORT_LIMIT).collect::<Vec<_>>(),
        "validation_passed": invalid_docs.is_empty(),
    });

    if bool_or(&args, "fix_invalid", false) && !invalid_docs.is_empty() {
        let mut removed = 0usize;
        for doc in &invalid_docs {
            if let Some(key) = doc["_key"].as_str() {
                if db.remove_document(collection, key).await.is_ok() {
                    removed += 1;
                }
            }
        }
        result["removed_count"] = json!(removed);
    }
    Ok(result)
}

/// Insert a document only after its reference fields check out.
pub async fn insert_with_validation(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let document = require_object(&args, "document")?;
    let ref_fields = string_list(&args, "reference_fields");

    if !ref_fields.is_empty() {
        let query = "
            LET d = @doc
            LET invalid_refs = (
              FOR field IN @fields
                LET ref = DOCUMENT(d[field])
                FILTER ref == null AND d[field] != null
                RETURN {field: field, value: d[field]}
            )
            RETURN invalid_refs
        ";
        let mut binds = Map::new();
        binds.insert("doc".to_string(), Value::Object(document.clone()));
        binds.insert("fields".to_string(), json!(ref_fields));
        let rows = db.aql_query(query, &binds).await?;
        let invalid = rows
            .first()
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if !invalid.is_empty() {
            return Ok(json!({"error": "Invalid references", "invalid_references": invalid}));
        }
    }

    let result = db
        .insert_document(collection, &Value::Object(document.clone()))
        .await?;
    Ok(document_meta(&result))
}

/// Per-batch outcome accounting shared by the bulk tools.
struct BatchReport {
    ok_count: usize,
    error_count: usize,
    errors: Vec<Value>,
    ok_ids: Vec<Value>,
}

impl BatchReport {
    fn new() -> Self {
        Self {
            ok_count: 0,
            error_count: 0,
            errors: Vec::new(),
            ok_ids: Vec::new(),
        }
    }

    /// Fold per-document results from a multi-document write.
    fn absorb(&mut self, batch_start: usize, outcomes: &[Value]) {
        for (offset, outcome) in outcomes.iter().enumerate() {
            if outcome["error"].as_bool().unwrap_or(false) {
                self.error_count += 1;
                self.errors.push(json!({
                    "index": batch_start + offset,
                    "error": outcome["errorMessage"].clone(),
                }));
            } else {
                self.ok_count += 1;
                if let Some(id) = outcome.get("_id") {
                    self.ok_ids.push(id.clone());
                }
            }
        }
    }

    fn batch_failed(&mut self, batch_start: usize, batch_len: usize, error: String) {
        self.error_count += batch_len;
        self.errors.push(json!({
            "batch_start": batch_start,
            "batch_size": batch_len,
            "error": error,
        }));
    }
}

/// Insert many documents with batching; `on_error` controls whether a failed
/// batch stops the run.
pub async fn bulk_insert(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let documents = require_array(&args, "documents")?;
    let batch_size = i64_or(&args, "batch_size", 1000).max(1) as usize;
    let on_error = opt_str(&args, "on_error").unwrap_or("stop");

    let mut report = BatchReport::new();
    for (start, batch) in batches(documents, batch_size) {
        match db.insert_documents(collection, batch).await {
            Ok(outcomes) => report.absorb(start, &outcomes),
            Err(err) => {
                report.batch_failed(start, batch.len(), err.to_string());
                if on_error == "stop" {
                    break;
                }
            }
        }
    }

    let total = documents.len();
    let success_rate = if total > 0 {
        report.ok_count as f64 / total as f64
    } else {
        0.0
    };
    Ok(json!({
        "total_documents": total,
        "inserted_count": report.ok_count,
        "error_count": report.error_count,
        "errors": report.errors,
        "inserted_ids": report.ok_ids,
        "success_rate": success_rate,
    }))
}

/// Update many documents by key with batching.
///
/// Each update item carries its key as `key` or `_key`, and its payload
/// either under `update` or as the item's remaining top-level fields.
pub async fn bulk_update(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let updates = require_array(&args, "updates")?;
    let batch_size = i64_or(&args, "batch_size", 1000).max(1) as usize;
    let on_error = opt_str(&args, "on_error").unwrap_or("stop");

    let mut report = BatchReport::new();
    for (start, batch) in batches(updates, batch_size) {
        let mut normalized = Vec::with_capacity(batch.len());
        for (offset, item) in batch.iter().enumerate() {
            match normalize_update(item) {
                Some(payload) => normalized.push(payload),
                None => {
                    report.error_count += 1;
                    report.errors.push(json!({
                        "index": start + offset,
                        "error": "Update item is missing 'key' or '_key'",
                    }));
                }
            }
        }
        if normalized.is_empty() {
            continue;
        }
        match db.update_documents(collection, &normalized).await {
            Ok(outcomes) => report.absorb(start, &outcomes),
            Err(err) => {
                report.batch_failed(start, normalized.len(), err.to_string());
                if on_error == "stop" {
                    break;
                }
            }
        }
    }

    Ok(json!({
        "total_updates": updates.len(),
        "updated_count": report.ok_count,
        "error_count": report.error_count,
        "errors": report.errors,
    }))
}

/// Rewrite an update item into the `{_key, ...fields}` shape the document
/// API expects.
fn normalize_update(item: &Value) -> Option<Value> {
    let map = item.as_object()?;
    let key = map
        .get("key")
        .or_else(|| map.get("_key"))
        .and_then(Value::as_str)?
        .to_string();
    let mut payload = match map.get("update").and_then(Value::as_object) {
        Some(update) => update.clone(),
        None => {
            let mut rest = map.clone();
            rest.remove("key");
            rest.remove("_key");
            rest
        }
    };
    payload.insert("_key".to_string(), json!(key));
    Some(Value::Object(payload))
}

fn batches(items: &[Value], batch_size: usize) -> impl Iterator<Item = (usize, &[Value])> {
    items
        .chunks(batch_size)
        .enumerate()
        .map(move |(i, chunk)| (i * batch_size, chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_update_with_explicit_payload() {
        let item = json!({"key": "42", "update": {"status": "done"}});
        let payload = normalize_update(&item).unwrap();
        assert_eq!(payload, json!({"_key": "42", "status": "done"}));
    }

    #[test]
    fn test_normalize_update_inline_fields() {
        let item = json!({"_key": "7", "name": "x", "age": 3});
        let payload = normalize_update(&item).unwrap();
        assert_eq!(payload["_key"], json!("7"));
        assert_eq!(payload["name"], json!("x"));
        assert!(payload.get("key").is_none());
    }

    #[test]
    fn test_normalize_update_without_key() {
        assert!(normalize_update(&json!({"name": "x"})).is_none());
    }

    #[test]
    fn test_batches_cover_all_items() {
        let items: Vec<Value> = (0..5).map(|i| json!(i)).collect();
        let chunks: Vec<(usize, usize)> = batches(&items, 2).map(|(s, c)| (s, c.len())).collect();
        assert_eq!(chunks, vec![(0, 2), (2, 2), (4, 1)]);
    }

    #[test]
    fn test_batch_report_splits_outcomes() {
        let mut report = BatchReport::new();
        report.absorb(
            10,
            &[
                json!({"_id": "users/1", "_key": "1"}),
                json!({"error": true, "errorMessage": "unique constraint violated"}),
            ],
        );
        assert_eq!(report.ok_count, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.errors[0]["index"], json!(11));
        assert_eq!(report.ok_ids, vec![json!("users/1")]);
    }
}
