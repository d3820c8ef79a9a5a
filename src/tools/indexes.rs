//! Index management and query analysis tools.

use crate::db::ArangoClient;
use crate::error::{HandlerError, HandlerResult};
use crate::tools::args::{
    bind_vars, bool_or, i64_or, opt_bool, opt_i64, opt_str, require_str, string_list,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

fn simplify_index(ix: &Value) -> Value {
    json!({
        "id": ix.get("id").cloned().unwrap_or(Value::Null),
        "type": ix.get("type").cloned().unwrap_or(Value::Null),
        "fields": ix.get("fields").cloned().unwrap_or(Value::Null),
        "unique": ix.get("unique").cloned().unwrap_or(Value::Null),
        "sparse": ix.get("sparse").cloned().unwrap_or(Value::Null),
        "name": ix.get("name").cloned().unwrap_or(Value::Null),
    })
}

pub async fn list_indexes(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let indexes = db.list_indexes(collection).await?;
    let simplified: Vec<Value> = indexes
        .iter()
        .map(|ix| {
            let mut entry = simplify_index(ix);
            entry["selectivityEstimate"] = ix
                .get("selectivityEstimate")
                .cloned()
                .unwrap_or(Value::Null);
            entry
        })
        .collect();
    Ok(Value::Array(simplified))
}

/// Create an index. Type-specific options are assembled into the definition
/// the index API expects.
pub async fn create_index(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let ix_type = opt_str(&args, "type").unwrap_or("persistent");
    let fields = string_list(&args, "fields");
    if fields.is_empty() {
        return Err(HandlerError::invalid("'fields' must not be empty"));
    }

    let mut definition = json!({"type": ix_type, "fields": fields});
    if let Some(name) = opt_str(&args, "name") {
        definition["name"] = json!(name);
    }
    if let Some(bg) = opt_bool(&args, "in_background") {
        definition["inBackground"] = json!(bg);
    }

    match ix_type {
        "persistent" | "hash" | "skiplist" => {
            definition["unique"] = json!(bool_or(&args, "unique", false));
            definition["sparse"] = json!(bool_or(&args, "sparse", false));
            definition["deduplicate"] = json!(bool_or(&args, "deduplicate", true));
        }
        "ttl" => {
            if fields.len() != 1 {
                return Err(HandlerError::invalid(
                    "TTL index requires exactly one field in 'fields'",
                ));
            }
            let Some(expire_after) = opt_i64(&args, "ttl") else {
                return Err(HandlerError::invalid(
                    "TTL index requires 'ttl' (expireAfter seconds)",
                ));
            };
            definition["expireAfter"] = json!(expire_after);
        }
        "fulltext" => {
            if let Some(min_length) = opt_i64(&args, "min_length") {
                definition["minLength"] = json!(min_length);
            }
        }
        "geo" => {
            if let Some(geo_json) = opt_bool(&args, "geo_json") {
                definition["geoJson"] = json!(geo_json);
            }
        }
        other => return Err(HandlerError::invalid(format!("Unknown index type: {other}"))),
    }

    let created = db.create_index(collection, &definition).await?;
    Ok(simplify_index(&created))
}

/// Delete an index by full id (`collection/12345`) or by name.
pub async fn delete_index(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let id_or_name = require_str(&args, "id_or_name")?;

    let mut index_id = id_or_name.to_string();
    if !index_id.contains('/') {
        // A bare value is taken as a name and resolved against the
        // collection's index list.
        let indexes = db.list_indexes(collection).await?;
        index_id = indexes
            .iter()
            .find(|ix| ix["name"].as_str() == Some(id_or_name))
            .and_then(|ix| ix["id"].as_str())
            .map(String::from)
            .ok_or_else(|| {
                HandlerError::invalid(format!(
                    "Index with name '{id_or_name}' not found in collection '{collection}'"
                ))
            })?;
    }
    if !index_id.contains('/') {
        index_id = format!("{collection}/{index_id}");
    }

    let result = db.delete_index(&index_id).await?;
    Ok(json!({"deleted": true, "id": index_id, "result": result}))
}

/// Explain a query and optionally attach heuristic index suggestions.
pub async fn explain_query(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let query = require_str(&args, "query")?;
    let binds = bind_vars(&args);
    let max_plans = i64_or(&args, "max_plans", 1);
    let mut result = db.aql_explain(query, &binds, max_plans).await?;
    if bool_or(&args, "suggest_indexes", true) {
        let suggestions = suggest_indexes(result["plans"].as_array().map(Vec::as_slice).unwrap_or(&[]));
        result["index_suggestions"] = json!(suggestions);
    }
    Ok(result)
}

/// Explain plans and stats without suggestions, for profiling.
pub async fn query_profile(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let query = require_str(&args, "query")?;
    let binds = bind_vars(&args);
    let max_plans = i64_or(&args, "max_plans", 1);
    db.aql_explain(query, &binds, max_plans).await.map_err(Into::into)
}

/// Heuristic suggestions from plan nodes: full collection scans and filters
/// without an index node get a generic hint.
fn suggest_indexes(plans: &[Value]) -> Vec<Value> {
    let mut suggestions = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for plan in plans {
        for node in plan["nodes"].as_array().into_iter().flatten() {
            let node_type = node["type"].as_str().unwrap_or("");
            if node_type == "Filter" || node_type == "EnumerateCollection" {
                let node_id = node.get("id").cloned().unwrap_or(Value::Null);
                if seen.insert(node_id.to_string()) {
                    suggestions.push(json!({
                        "hint": "Consider adding a persistent/hash index for filtered fields",
                        "nodeId": node_id,
                    }));
                }
            }
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_flag_scans_and_filters() {
        let plans = vec![json!({
            "nodes": [
                {"type": "SingletonNode", "id": 1},
                {"type": "EnumerateCollection", "id": 2},
                {"type": "Filter", "id": 3},
                {"type": "ReturnNode", "id": 4},
            ]
        })];
        let suggestions = suggest_indexes(&plans);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0]["nodeId"], json!(2));
    }

    #[test]
    fn test_suggestions_deduplicated() {
        let plan = json!({"nodes": [{"type": "Filter", "id": 7}]});
        let suggestions = suggest_indexes(&[plan.clone(), plan]);
        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn test_index_plan_produces_no_suggestions() {
        let plans = vec![json!({"nodes": [{"type": "IndexNode", "id": 2}]})];
        assert!(suggest_indexes(&plans).is_empty());
    }

    #[test]
    fn test_simplify_index_keeps_known_fields() {
        let ix = json!({
            "id": "users/1", "type": "persistent", "fields": ["email"],
            "unique": true, "sparse": false, "name": "ix_email", "figures": {}
        });
        let simplified = simplify_index(&ix);
        assert_eq!(simplified["id"], json!("users/1"));
        assert!(simplified.get("figures").is_none());
    }
}
