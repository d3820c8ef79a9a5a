//! Graph tools: named graphs, edges, traversal, and shortest path.

use crate::db::ArangoClient;
use crate::error::{HandlerError, HandlerResult};
use crate::tools::args::{
    bool_or, document_meta, i64_or, opt_i64, opt_str, require_array, require_str, string_list,
};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Create a named graph from edge definitions, optionally creating the
/// backing collections first.
pub async fn create_graph(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let name = require_str(&args, "name")?;
    let edge_defs = require_array(&args, "edge_definitions")?;
    let create_collections = bool_or(&args, "create_collections", true);

    let mut api_defs = Vec::with_capacity(edge_defs.len());
    let mut vertex_collections = BTreeSet::new();
    for def in edge_defs {
        let edge_collection = def["edge_collection"]
            .as_str()
            .ok_or_else(|| HandlerError::missing("edge_collection"))?;
        let from: Vec<String> = string_values(&def["from_collections"]);
        let to: Vec<String> = string_values(&def["to_collections"]);
        vertex_collections.extend(from.iter().cloned());
        vertex_collections.extend(to.iter().cloned());

        if create_collections {
            if !db.has_collection(edge_collection).await? {
                db.create_collection(edge_collection, true, None).await?;
            }
            for vc in from.iter().chain(to.iter()) {
                if !db.has_collection(vc).await? {
                    db.create_collection(vc, false, None).await?;
                }
            }
        }
        api_defs.push(json!({"collection": edge_collection, "from": from, "to": to}));
    }

    if !db.has_graph(name).await? {
        db.create_graph(name, &api_defs).await?;
    }

    Ok(json!({
        "name": name,
        "edge_definitions": edge_defs,
        "vertex_collections": vertex_collections.into_iter().collect::<Vec<_>>(),
    }))
}

/// Insert an edge document with `_from`, `_to`, and optional attributes.
pub async fn add_edge(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let collection = require_str(&args, "collection")?;
    let from_id = require_str(&args, "from_id")?;
    let to_id = require_str(&args, "to_id")?;
    let mut payload = args
        .get("attributes")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    payload.insert("_from".to_string(), json!(from_id));
    payload.insert("_to".to_string(), json!(to_id));
    let result = db.insert_document(collection, &Value::Object(payload)).await?;
    Ok(document_meta(&result))
}

/// Bounded traversal over a named graph or explicit edge collections.
pub async fn traverse(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let start = require_str(&args, "start_vertex")?;
    let direction = opt_str(&args, "direction").unwrap_or("OUTBOUND");
    let min_depth = i64_or(&args, "min_depth", 1);
    let max_depth = i64_or(&args, "max_depth", 1);
    let return_paths = bool_or(&args, "return_paths", false);
    let limit = opt_i64(&args, "limit");

    // Depths and direction come from validated integer/enum fields, so they
    // can be spliced into the query text; everything else is a bind var.
    let source = graph_source(&args)?;
    let limit_clause = if limit.is_some() { "LIMIT @limit" } else { "" };
    let return_expr = if return_paths { "p" } else { "{ vertex: v, edge: e }" };
    let query = format!(
        "FOR v, e, p IN {min_depth}..{max_depth} {direction} @start {source}\n  {limit_clause}\n  RETURN {return_expr}"
    );

    let mut binds = Map::new();
    binds.insert("start".to_string(), json!(start));
    if let Some(graph) = opt_str(&args, "graph") {
        binds.insert("graph".to_string(), json!(graph));
    }
    if let Some(limit) = limit {
        binds.insert("limit".to_string(), json!(limit));
    }
    let rows = db.aql_query(&query, &binds).await?;
    Ok(Value::Array(rows))
}

/// Shortest path between two vertices, returned as vertex and edge lists.
pub async fn shortest_path(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let start = require_str(&args, "start_vertex")?;
    let end = require_str(&args, "end_vertex")?;
    let direction = opt_str(&args, "direction").unwrap_or("OUTBOUND");

    let source = graph_source(&args)?;
    let query = format!(
        "FOR v, e IN {direction} SHORTEST_PATH @start TO @end {source}\n  RETURN {{ vertex: v, edge: e }}"
    );
    let mut binds = Map::new();
    binds.insert("start".to_string(), json!(start));
    binds.insert("end".to_string(), json!(end));
    if let Some(graph) = opt_str(&args, "graph") {
        binds.insert("graph".to_string(), json!(graph));
    }

    let rows = db.aql_query(&query, &binds).await?;
    if rows.is_empty() {
        return Ok(json!({"found": false}));
    }
    // One row per hop; fold into parallel vertex/edge lists. The first hop
    // has a null edge.
    let vertices: Vec<Value> = rows.iter().map(|r| r["vertex"].clone()).collect();
    let edges: Vec<Value> = rows
        .iter()
        .filter(|r| !r["edge"].is_null())
        .map(|r| r["edge"].clone())
        .collect();
    Ok(json!({"found": true, "vertices": vertices, "edges": edges}))
}

pub async fn list_graphs(db: Arc<ArangoClient>, _args: Map<String, Value>) -> HandlerResult {
    let graphs = db.list_graphs().await?;
    let result: Vec<Value> = graphs
        .iter()
        .map(|g| {
            let name = g
                .get("name")
                .filter(|n| !n.is_null())
                .or_else(|| g.get("_key"))
                .cloned()
                .unwrap_or(Value::Null);
            json!({"name": name, "_raw": g})
        })
        .collect();
    Ok(Value::Array(result))
}

pub async fn add_vertex_collection(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let graph = require_str(&args, "graph")?;
    let collection = require_str(&args, "collection")?;
    db.add_vertex_collection(graph, collection).await?;
    Ok(json!({"graph": graph, "collection_added": collection}))
}

pub async fn add_edge_definition(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let graph = require_str(&args, "graph")?;
    let edge_collection = require_str(&args, "edge_collection")?;
    let from = string_list(&args, "from_collections");
    let to = string_list(&args, "to_collections");
    db.add_edge_definition(graph, edge_collection, &from, &to).await?;
    Ok(json!({
        "graph": graph,
        "edge_definition": {
            "edge_collection": edge_collection,
            "from_collections": from,
            "to_collections": to,
        },
    }))
}

/// The traversal source clause: `GRAPH @graph` for a named graph, or a
/// comma-separated edge collection list.
fn graph_source(args: &Map<String, Value>) -> Result<String, HandlerError> {
    if opt_str(args, "graph").is_some() {
        return Ok("GRAPH @graph".to_string());
    }
    let edge_collections = string_list(args, "edge_collections");
    if edge_collections.is_empty() {
        return Err(HandlerError::invalid(
            "edge_collections must be provided when graph is not specified",
        ));
    }
    Ok(edge_collections.join(", "))
}

fn string_values(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_source_prefers_named_graph() {
        let args = json!({"graph": "social", "edge_collections": ["knows"]})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(graph_source(&args).unwrap(), "GRAPH @graph");
    }

    #[test]
    fn test_graph_source_joins_edge_collections() {
        let args = json!({"edge_collections": ["knows", "follows"]})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(graph_source(&args).unwrap(), "knows, follows");
    }

    #[test]
    fn test_graph_source_requires_one_of_the_two() {
        let err = graph_source(&Map::new()).unwrap_err();
        assert!(err.to_string().contains("edge_collections"));
    }
}
