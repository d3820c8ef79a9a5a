//! Structured query builder: filters, sort, and limit assembled into AQL.

use crate::db::ArangoClient;
use crate::error::{HandlerError, HandlerResult};
use crate::tools::args::{opt_i64, require_str, string_list};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Build an AQL query from structured clauses and execute it.
///
/// The collection goes through a `@@col` bind var; filter values are
/// embedded as JSON literals, and field names and operators come from
/// enum-validated schema fields.
pub async fn query_builder(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let query = build_query(&args)?;
    let mut binds = Map::new();
    binds.insert("@col".to_string(), Value::String(collection.to_string()));
    let rows = db.aql_query(&query, &binds).await?;
    Ok(Value::Array(rows))
}

fn build_query(args: &Map<String, Value>) -> Result<String, HandlerError> {
    let mut query = String::from("FOR doc IN @@col");

    let filters = args.get("filters").and_then(Value::as_array);
    if let Some(filters) = filters.filter(|f| !f.is_empty()) {
        let clauses: Result<Vec<String>, HandlerError> =
            filters.iter().map(filter_clause).collect();
        query.push_str("\n  FILTER ");
        query.push_str(&clauses?.join(" AND "));
    }

    let sorts = args.get("sort").and_then(Value::as_array);
    if let Some(sorts) = sorts.filter(|s| !s.is_empty()) {
        let exprs: Vec<String> = sorts
            .iter()
            .map(|s| {
                let field = s["field"].as_str().unwrap_or_default();
                let direction = s["direction"].as_str().unwrap_or("ASC");
                format!("doc.{field} {direction}")
            })
            .collect();
        query.push_str("\n  SORT ");
        query.push_str(&exprs.join(", "));
    }

    if let Some(limit) = opt_i64(args, "limit") {
        query.push_str(&format!("\n  LIMIT {limit}"));
    }

    let return_fields = string_list(args, "return_fields");
    if return_fields.is_empty() {
        query.push_str("\n  RETURN doc");
    } else {
        let projection: Vec<String> = return_fields
            .iter()
            .map(|f| format!("{f}: doc.{f}"))
            .collect();
        query.push_str(&format!("\n  RETURN {{{}}}", projection.join(", ")));
    }
    Ok(query)
}

fn filter_clause(filter: &Value) -> Result<String, HandlerError> {
    let field = filter["field"]
        .as_str()
        .ok_or_else(|| HandlerError::missing("field"))?;
    let op = filter["op"]
        .as_str()
        .ok_or_else(|| HandlerError::missing("op"))?;
    let value = filter.get("value").cloned().unwrap_or(Value::Null);
    let literal = serde_json::to_string(&value)
        .map_err(|e| HandlerError::unexpected(format!("Unserializable filter value: {e}")))?;
    Ok(match op {
        "LIKE" => format!("LIKE(doc.{field}, {literal})"),
        "IN" => format!("doc.{field} IN {literal}"),
        _ => format!("doc.{field} {op} {literal}"),
    })
}
