//! Collection backup: dump collections as JSON array files.

use crate::db::ArangoClient;
use crate::error::{HandlerError, HandlerResult};
use crate::tools::args::{opt_i64, opt_str};
use chrono::Local;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};

/// Validate a backup target directory.
///
/// Rejects `..` traversal outright; otherwise the path must resolve under
/// the current working directory or the system temp directory.
pub fn validate_output_dir(raw: &str) -> Result<PathBuf, HandlerError> {
    if raw.contains("..") {
        return Err(HandlerError::invalid(
            "Path traversal detected: '..' not allowed in path",
        ));
    }
    let cwd = env::current_dir()
        .map_err(|e| HandlerError::unexpected(format!("Cannot resolve working directory: {e}")))?;
    let abs = if Path::new(raw).is_absolute() {
        PathBuf::from(raw)
    } else {
        cwd.join(raw)
    };
    if abs.starts_with(env::temp_dir()) || abs.starts_with(&cwd) {
        return Ok(abs);
    }
    Err(HandlerError::invalid(format!(
        "Output directory '{raw}' is not allowed. Must be within current working directory or temp directory."
    )))
}

/// Dump selected (or all non-system) collections into `<name>.json` files.
///
/// Unknown collections are skipped silently; a collection that fails to
/// export is reported in the result rather than aborting the run.
pub async fn backup_collections_to_dir(
    db: &ArangoClient,
    output_dir: Option<&str>,
    collections: Option<Vec<String>>,
    doc_limit: Option<i64>,
) -> HandlerResult {
    let target = match output_dir.filter(|d| !d.trim().is_empty()) {
        Some(dir) => validate_output_dir(dir)?,
        None => {
            let ts = Local::now().format("%Y%m%d_%H%M%S");
            validate_output_dir(&format!("backups/{ts}"))?
        }
    };
    fs::create_dir_all(&target)
        .map_err(|e| HandlerError::unexpected(format!("Cannot create output directory: {e}")))?;

    let all_collections: Vec<String> = db
        .list_collections()
        .await?
        .iter()
        .filter(|c| !c["isSystem"].as_bool().unwrap_or(false))
        .filter_map(|c| c["name"].as_str().map(String::from))
        .collect();
    let targets = collections.unwrap_or_else(|| all_collections.clone());

    let mut written = Vec::new();
    let mut total_documents: i64 = 0;
    for name in &targets {
        if !all_collections.contains(name) {
            continue;
        }
        let path = target.join(format!("{name}.json"));
        match export_collection(db, name, doc_limit).await {
            Ok(docs) => match write_documents(&path, &docs) {
                Ok(()) => {
                    total_documents += docs.len() as i64;
                    written.push(json!({
                        "collection": name,
                        "path": path.to_string_lossy(),
                        "count": docs.len(),
                    }));
                }
                Err(e) => written.push(json!({
                    "collection": name,
                    "path": path.to_string_lossy(),
                    "count": 0,
                    "error": e.to_string(),
                })),
            },
            Err(e) => written.push(json!({
                "collection": name,
                "path": path.to_string_lossy(),
                "count": 0,
                "error": e.to_string(),
            })),
        }
    }

    Ok(json!({
        "output_dir": target.to_string_lossy(),
        "written": written,
        "total_collections": written.len(),
        "total_documents": total_documents,
    }))
}

async fn export_collection(
    db: &ArangoClient,
    collection: &str,
    doc_limit: Option<i64>,
) -> Result<Vec<Value>, crate::error::DbError> {
    let mut binds = Map::new();
    binds.insert("@col".to_string(), json!(collection));
    let query = match doc_limit {
        Some(limit) => {
            binds.insert("limit".to_string(), json!(limit));
            "FOR doc IN @@col LIMIT @limit RETURN doc"
        }
        None => "FOR doc IN @@col RETURN doc",
    };
    db.aql_query(query, &binds).await
}

fn write_documents(path: &Path, docs: &[Value]) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(docs)?;
    fs::write(path, body)
}

/// The `arango_backup` tool handler.
pub async fn backup(db: Arc<ArangoClient>, args: Map<String, Value>) -> HandlerResult {
    let output_dir = opt_str(&args, "output_dir");
    // Single-collection form folds into the list form.
    let collections = match args.get("collections").and_then(Value::as_array) {
        Some(list) => Some(
            list.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        ),
        None => opt_str(&args, "collection").map(|c| vec![c.to_string()]),
    };
    let doc_limit = opt_i64(&args, "doc_limit");
    backup_collections_to_dir(&db, output_dir, collections, doc_limit).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_components_rejected() {
        let err = validate_output_dir("backups/../../etc").unwrap_err();
        assert!(err.to_string().contains("Path traversal"));
    }

    #[test]
    fn test_relative_path_resolves_under_cwd() {
        let resolved = validate_output_dir("backups/20240101_000000").unwrap();
        assert!(resolved.starts_with(env::current_dir().unwrap()));
    }

    #[test]
    fn test_temp_dir_is_allowed() {
        let temp = env::temp_dir().join("arango_backup_test");
        let resolved = validate_output_dir(temp.to_str().unwrap()).unwrap();
        assert_eq!(resolved, temp);
    }

    #[test]
    fn test_absolute_path_outside_cwd_rejected() {
        // Root itself is neither the cwd nor the temp dir.
        let err = validate_output_dir("/definitely-not-allowed").unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_write_documents_produces_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let docs = vec![json!({"_key": "1", "name": "a"}), json!({"_key": "2"})];
        write_documents(&path, &docs).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, docs);
    }
}
