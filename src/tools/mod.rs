//! Tool handlers and registry population.
//!
//! Each submodule implements one category of tools; [`build_registry`] wires
//! every tool's name, description, input schema, and handler into the
//! registry. The first seven registrations form the baseline compatibility
//! toolset, so their order is part of the wire contract.

pub mod args;
pub mod backup;
pub mod bulk;
pub mod documents;
pub mod graph;
pub mod indexes;
pub mod query_builder;
pub mod schema_store;

use crate::db::ArangoClient;
use crate::error::{HandlerResult, RegistryError};
use crate::registry::{Handler, ToolRegistration, ToolRegistry};
use crate::schema::{FieldKind, FieldSpec, SchemaDescriptor};
use serde_json::{Map, Value, json};
use std::future::Future;
use std::sync::Arc;

fn wrap<F, Fut>(f: F) -> Handler
where
    F: Fn(Arc<ArangoClient>, Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |db, args| Box::pin(f(db, args)))
}

fn tool(
    name: &'static str,
    description: &'static str,
    schema: SchemaDescriptor,
    handler: Handler,
) -> ToolRegistration {
    ToolRegistration {
        name,
        description,
        schema,
        handler,
    }
}

fn bind_vars_field() -> FieldSpec {
    FieldSpec::optional("bind_vars", FieldKind::Object)
        .describe("Optional bind variables for the AQL query")
}

fn edge_definition_schema() -> SchemaDescriptor {
    SchemaDescriptor::new()
        .field(FieldSpec::required("edge_collection", FieldKind::String))
        .field(FieldSpec::required("from_collections", FieldKind::StringArray))
        .field(FieldSpec::required("to_collections", FieldKind::StringArray))
}

fn traversal_schema() -> SchemaDescriptor {
    SchemaDescriptor::new()
        .field(FieldSpec::required("start_vertex", FieldKind::String))
        .field(
            FieldSpec::optional("direction", FieldKind::String)
                .default_value(json!("OUTBOUND"))
                .one_of(&["OUTBOUND", "INBOUND", "ANY"]),
        )
        .field(FieldSpec::optional("min_depth", FieldKind::Integer).default_value(json!(1)))
        .field(FieldSpec::optional("max_depth", FieldKind::Integer).default_value(json!(1)))
        .field(FieldSpec::optional("graph", FieldKind::String))
        .field(FieldSpec::optional("edge_collections", FieldKind::StringArray))
        .field(FieldSpec::optional("return_paths", FieldKind::Boolean).default_value(json!(false)))
        .field(FieldSpec::optional("limit", FieldKind::Integer))
}

/// Build the complete tool registry.
///
/// Called once at startup; a duplicate name or an empty result is fatal.
pub fn build_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();

    // Core data tools. These seven are the baseline compatibility set and
    // must stay first, in this order.
    registry.register(tool(
        "arango_query",
        "Execute an AQL query with optional bind vars and return rows.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("query", FieldKind::String).describe("AQL query string"))
            .field(bind_vars_field()),
        wrap(documents::query),
    ))?;
    registry.register(tool(
        "arango_list_collections",
        "List non-system collection names.",
        SchemaDescriptor::new(),
        wrap(documents::list_collections),
    ))?;
    registry.register(tool(
        "arango_insert",
        "Insert a document into a collection.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("document", FieldKind::Object)),
        wrap(documents::insert),
    ))?;
    registry.register(tool(
        "arango_update",
        "Update a document by key in a collection.",
        SchemaDescriptor::new()
            .field(
                FieldSpec::required("collection", FieldKind::String)
                    .describe("Name of the collection containing the document"),
            )
            .field(FieldSpec::required("key", FieldKind::String).describe("Document key to update"))
            .field(
                FieldSpec::required("update", FieldKind::Object)
                    .describe("Fields to update in the document"),
            ),
        wrap(documents::update),
    ))?;
    registry.register(tool(
        "arango_remove",
        "Remove a document by key in a collection.",
        SchemaDescriptor::new()
            .field(
                FieldSpec::required("collection", FieldKind::String)
                    .describe("Name of the collection containing the document"),
            )
            .field(FieldSpec::required("key", FieldKind::String).describe("Document key to remove")),
        wrap(documents::remove),
    ))?;
    registry.register(tool(
        "arango_create_collection",
        "Create a collection (document or edge).",
        SchemaDescriptor::new()
            .field(
                FieldSpec::required("name", FieldKind::String)
                    .describe("Name of the collection to create"),
            )
            .field(
                FieldSpec::optional("type", FieldKind::String)
                    .default_value(json!("document"))
                    .one_of(&["document", "edge"])
                    .describe("Type of collection (document or edge)"),
            )
            .field(
                FieldSpec::optional("wait_for_sync", FieldKind::Boolean)
                    .alias("waitForSync")
                    .describe("Whether to wait for sync to disk"),
            ),
        wrap(documents::create_collection),
    ))?;
    registry.register(tool(
        "arango_backup",
        "Backup collections to JSON files.",
        SchemaDescriptor::new()
            .field(
                FieldSpec::optional("output_dir", FieldKind::String)
                    .alias("outputDir")
                    .describe("Directory to write backup files (defaults to timestamped backups/ folder)"),
            )
            .field(
                FieldSpec::optional("collection", FieldKind::String)
                    .describe("Single collection to backup"),
            )
            .field(
                FieldSpec::optional("collections", FieldKind::StringArray)
                    .describe("Collections to backup (all non-system collections when omitted)"),
            )
            .field(
                FieldSpec::optional("doc_limit", FieldKind::Integer)
                    .alias("docLimit")
                    .describe("Maximum number of documents to backup per collection"),
            ),
        wrap(backup::backup),
    ))?;

    // Indexing and query analysis.
    registry.register(tool(
        "arango_list_indexes",
        "List indexes for a collection.",
        SchemaDescriptor::new().field(
            FieldSpec::required("collection", FieldKind::String)
                .describe("Collection name to list indexes for"),
        ),
        wrap(indexes::list_indexes),
    ))?;
    registry.register(tool(
        "arango_create_index",
        "Create an index on a collection (persistent, hash, skiplist, ttl, fulltext, geo).",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(
                FieldSpec::optional("type", FieldKind::String)
                    .default_value(json!("persistent"))
                    .one_of(&["persistent", "hash", "skiplist", "ttl", "fulltext", "geo"]),
            )
            .field(
                FieldSpec::required("fields", FieldKind::StringArray)
                    .describe("Field paths to index"),
            )
            .field(FieldSpec::optional("unique", FieldKind::Boolean).default_value(json!(false)))
            .field(FieldSpec::optional("sparse", FieldKind::Boolean).default_value(json!(false)))
            .field(
                FieldSpec::optional("deduplicate", FieldKind::Boolean).default_value(json!(true)),
            )
            .field(FieldSpec::optional("name", FieldKind::String).describe("Custom index name"))
            .field(FieldSpec::optional("in_background", FieldKind::Boolean).alias("inBackground"))
            .field(
                FieldSpec::optional("ttl", FieldKind::Integer)
                    .alias("expireAfter")
                    .describe("TTL seconds (expireAfter) for TTL index"),
            )
            .field(
                FieldSpec::optional("min_length", FieldKind::Integer)
                    .alias("minLength")
                    .describe("Minimum length for fulltext index"),
            )
            .field(
                FieldSpec::optional("geo_json", FieldKind::Boolean)
                    .alias("geoJson")
                    .describe("Whether fields are in GeoJSON format"),
            ),
        wrap(indexes::create_index),
    ))?;
    registry.register(tool(
        "arango_delete_index",
        "Delete an index by id or name from a collection.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(
                FieldSpec::required("id_or_name", FieldKind::String)
                    .describe("Index id (e.g., collection/12345) or name"),
            ),
        wrap(indexes::delete_index),
    ))?;
    registry.register(tool(
        "arango_explain_query",
        "Explain an AQL query and return execution plans and optional index suggestions.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("query", FieldKind::String))
            .field(bind_vars_field())
            .field(
                FieldSpec::optional("suggest_indexes", FieldKind::Boolean)
                    .default_value(json!(true)),
            )
            .field(FieldSpec::optional("max_plans", FieldKind::Integer).default_value(json!(1))),
        wrap(indexes::explain_query),
    ))?;

    // Reference validation and bulk writes.
    registry.register(tool(
        "arango_validate_references",
        "Validate that documents in a collection have valid references in specified fields.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("reference_fields", FieldKind::StringArray))
            .field(
                FieldSpec::optional("fix_invalid", FieldKind::Boolean).default_value(json!(false)),
            ),
        wrap(bulk::validate_references),
    ))?;
    registry.register(tool(
        "arango_insert_with_validation",
        "Insert a document after validating its reference fields.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("document", FieldKind::Object))
            .field(
                FieldSpec::optional("reference_fields", FieldKind::StringArray)
                    .default_value(json!([])),
            ),
        wrap(bulk::insert_with_validation),
    ))?;
    registry.register(tool(
        "arango_bulk_insert",
        "Bulk insert documents with batching and basic error handling.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("documents", FieldKind::ObjectArray))
            .field(
                FieldSpec::optional("batch_size", FieldKind::Integer).default_value(json!(1000)),
            )
            .field(
                FieldSpec::optional("on_error", FieldKind::String)
                    .default_value(json!("stop"))
                    .one_of(&["stop", "continue", "ignore"]),
            ),
        wrap(bulk::bulk_insert),
    ))?;
    registry.register(tool(
        "arango_bulk_update",
        "Bulk update documents by key with batching.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("updates", FieldKind::ObjectArray))
            .field(
                FieldSpec::optional("batch_size", FieldKind::Integer).default_value(json!(1000)),
            )
            .field(
                FieldSpec::optional("on_error", FieldKind::String)
                    .default_value(json!("stop"))
                    .one_of(&["stop", "continue", "ignore"]),
            ),
        wrap(bulk::bulk_update),
    ))?;

    // Graph tools.
    registry.register(tool(
        "arango_create_graph",
        "Create a named graph with edge definitions (optionally creating collections).",
        SchemaDescriptor::new()
            .field(FieldSpec::required("name", FieldKind::String))
            .field(
                FieldSpec::required("edge_definitions", FieldKind::ObjectArray)
                    .elements(edge_definition_schema()),
            )
            .field(
                FieldSpec::optional("create_collections", FieldKind::Boolean)
                    .default_value(json!(true)),
            ),
        wrap(graph::create_graph),
    ))?;
    registry.register(tool(
        "arango_add_edge",
        "Add an edge document between two vertices with optional attributes.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(
                FieldSpec::required("from_id", FieldKind::String)
                    .describe("_from document id, e.g., users/123"),
            )
            .field(
                FieldSpec::required("to_id", FieldKind::String)
                    .describe("_to document id, e.g., orders/456"),
            )
            .field(FieldSpec::optional("attributes", FieldKind::Object).default_value(json!({}))),
        wrap(graph::add_edge),
    ))?;
    registry.register(tool(
        "arango_traverse",
        "Traverse graph from a start vertex with depth bounds (by graph or edge collections).",
        traversal_schema(),
        wrap(graph::traverse),
    ))?;
    registry.register(tool(
        "arango_shortest_path",
        "Compute the shortest path between two vertices (by graph or edge collections).",
        SchemaDescriptor::new()
            .field(FieldSpec::required("start_vertex", FieldKind::String))
            .field(FieldSpec::required("end_vertex", FieldKind::String))
            .field(
                FieldSpec::optional("direction", FieldKind::String)
                    .default_value(json!("OUTBOUND"))
                    .one_of(&["OUTBOUND", "INBOUND", "ANY"]),
            )
            .field(FieldSpec::optional("graph", FieldKind::String))
            .field(FieldSpec::optional("edge_collections", FieldKind::StringArray)),
        wrap(graph::shortest_path),
    ))?;
    registry.register(tool(
        "arango_list_graphs",
        "List available graphs in the database.",
        SchemaDescriptor::new(),
        wrap(graph::list_graphs),
    ))?;
    registry.register(tool(
        "arango_add_vertex_collection",
        "Add a vertex collection to a named graph.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("graph", FieldKind::String))
            .field(FieldSpec::required("collection", FieldKind::String)),
        wrap(graph::add_vertex_collection),
    ))?;
    registry.register(tool(
        "arango_add_edge_definition",
        "Create an edge definition in a named graph.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("graph", FieldKind::String))
            .field(FieldSpec::required("edge_collection", FieldKind::String))
            .field(FieldSpec::required("from_collections", FieldKind::StringArray))
            .field(FieldSpec::required("to_collections", FieldKind::StringArray)),
        wrap(graph::add_edge_definition),
    ))?;
    registry.register(tool(
        "arango_graph_traversal",
        "Alias for arango_traverse (graph traversal by graph or edge collections).",
        traversal_schema(),
        wrap(graph::traverse),
    ))?;
    registry.register(tool(
        "arango_add_vertex",
        "Alias for arango_insert (insert a vertex document into a collection).",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("document", FieldKind::Object)),
        wrap(documents::insert),
    ))?;

    // Schema management.
    registry.register(tool(
        "arango_create_schema",
        "Create or update a named JSON Schema for a collection.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("name", FieldKind::String))
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(
                FieldSpec::required("schema_def", FieldKind::Object)
                    .alias("schema")
                    .describe("JSON Schema draft-07 compatible schema"),
            ),
        wrap(schema_store::create_schema),
    ))?;
    registry.register(tool(
        "arango_validate_document",
        "Validate a document against a stored or inline JSON Schema.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(FieldSpec::required("document", FieldKind::Object))
            .field(
                FieldSpec::optional("schema_name", FieldKind::String)
                    .describe("Name of stored schema to use"),
            )
            .field(
                FieldSpec::optional("schema_def", FieldKind::Object)
                    .alias("schema")
                    .describe("Inline JSON Schema to validate against"),
            ),
        wrap(schema_store::validate_document),
    ))?;

    // Enhanced query tools.
    registry.register(tool(
        "arango_query_builder",
        "Build and execute a simple AQL query from filters, sort, and limit.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("collection", FieldKind::String))
            .field(
                FieldSpec::optional("filters", FieldKind::ObjectArray)
                    .default_value(json!([]))
                    .elements(
                        SchemaDescriptor::new()
                            .field(FieldSpec::required("field", FieldKind::String))
                            .field(
                                FieldSpec::required("op", FieldKind::String)
                                    .one_of(&["==", "!=", "<", "<=", ">", ">=", "IN", "LIKE"]),
                            )
                            .field(FieldSpec::required("value", FieldKind::Any)),
                    ),
            )
            .field(
                FieldSpec::optional("sort", FieldKind::ObjectArray)
                    .default_value(json!([]))
                    .elements(
                        SchemaDescriptor::new()
                            .field(FieldSpec::required("field", FieldKind::String))
                            .field(
                                FieldSpec::optional("direction", FieldKind::String)
                                    .default_value(json!("ASC"))
                                    .one_of(&["ASC", "DESC"]),
                            ),
                    ),
            )
            .field(FieldSpec::optional("limit", FieldKind::Integer))
            .field(
                FieldSpec::optional("return_fields", FieldKind::StringArray)
                    .describe("Fields to project; omit for full doc"),
            ),
        wrap(query_builder::query_builder),
    ))?;
    registry.register(tool(
        "arango_query_profile",
        "Explain a query and return plans/stats for profiling.",
        SchemaDescriptor::new()
            .field(FieldSpec::required("query", FieldKind::String))
            .field(bind_vars_field())
            .field(FieldSpec::optional("max_plans", FieldKind::Integer).default_value(json!(1))),
        wrap(indexes::query_profile),
    ))?;

    if registry.is_empty() {
        return Err(RegistryError::Empty);
    }
    Ok(registry)
}
