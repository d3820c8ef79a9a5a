//! ArangoDB HTTP API client.
//!
//! A thin async client over the ArangoDB REST API using `reqwest`. The
//! dispatcher treats a clone of this client as the live database handle;
//! handlers call the typed methods below and never build requests themselves.
//!
//! ArangoDB reports failures in the response body (`error`, `errorMessage`,
//! `errorNum`) even for non-2xx statuses, so error mapping reads the body
//! first and falls back to the HTTP status.

use crate::error::{DbError, DbResult};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Method, StatusCode, header};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, info};

/// Collection type codes used by the ArangoDB API.
const COLLECTION_TYPE_DOCUMENT: i64 = 2;
const COLLECTION_TYPE_EDGE: i64 = 3;

/// Connection settings for a single ArangoDB database.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server URL, e.g. `http://localhost:8529` (sensitive parts not logged).
    pub url: String,
    /// Target database name.
    pub database: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Live handle to one ArangoDB database.
#[derive(Debug, Clone)]
pub struct ArangoClient {
    http: reqwest::Client,
    /// Server URL without a trailing slash.
    base: String,
    database: String,
}

impl ArangoClient {
    /// Build a client without performing any I/O.
    ///
    /// Useful when a handle must exist before the server is reachable;
    /// [`ArangoClient::connect`] is the probing constructor.
    pub fn new(config: &ConnectionConfig) -> DbResult<Self> {
        let credentials = BASE64.encode(format!("{}:{}", config.username, config.password));
        let mut auth_value =
            header::HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|_| {
                DbError::connection("Credentials contain characters not valid in a header")
            })?;
        auth_value.set_sensitive(true);
        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DbError::connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
        })
    }

    /// Build a client and verify the database is reachable.
    pub async fn connect(config: &ConnectionConfig) -> DbResult<Self> {
        let client = Self::new(config)?;
        let current = client.request(Method::GET, "database/current", None).await?;
        let name = current["result"]["name"].as_str().unwrap_or(&client.database);
        info!(database = %name, "Connected to ArangoDB");
        Ok(client)
    }

    /// The database this handle targets.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Server version string, best-effort.
    pub async fn server_version(&self) -> Option<String> {
        let url = format!("{}/_api/version", self.base);
        let resp = self.http.get(&url).send().await.ok()?;
        let body: Value = resp.json().await.ok()?;
        body["version"].as_str().map(String::from)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/_db/{}/_api/{}", self.base, self.database, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> DbResult<(StatusCode, Value)> {
        let url = self.api_url(path);
        debug!(method = %method, path = %path, "ArangoDB request");
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let value: Value = response.json().await?;
        Ok((status, value))
    }

    /// Perform a request, mapping ArangoDB error bodies to `DbError`.
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> DbResult<Value> {
        let (status, value) = self.send(method, path, body).await?;
        if is_api_error(&value) || !status.is_success() {
            return Err(api_error(status, &value));
        }
        Ok(value)
    }

    /// Like [`request`], but a 404 becomes `Ok(None)` instead of an error.
    async fn request_opt(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> DbResult<Option<Value>> {
        let (status, value) = self.send(method, path, body).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if is_api_error(&value) || !status.is_success() {
            return Err(api_error(status, &value));
        }
        Ok(Some(value))
    }

    // ---- AQL ----

    /// Execute an AQL query and collect all result rows, following the
    /// server-side cursor until it is exhausted.
    pub async fn aql_query(
        &self,
        query: &str,
        bind_vars: &Map<String, Value>,
    ) -> DbResult<Vec<Value>> {
        let body = json!({"query": query, "bindVars": bind_vars});
        let mut response = self.request(Method::POST, "cursor", Some(&body)).await?;
        let mut rows = take_rows(&mut response);
        while response["hasMore"].as_bool().unwrap_or(false) {
            let id = response["id"]
                .as_str()
                .ok_or_else(|| DbError::response("Cursor marked hasMore without an id"))?
                .to_string();
            response = self
                .request(Method::PUT, &format!("cursor/{id}"), None)
                .await?;
            rows.append(&mut take_rows(&mut response));
        }
        Ok(rows)
    }

    /// Explain an AQL query. Always returns a `plans` list (a single plan is
    /// wrapped), plus `warnings` and `stats` as reported by the server.
    pub async fn aql_explain(
        &self,
        query: &str,
        bind_vars: &Map<String, Value>,
        max_plans: i64,
    ) -> DbResult<Value> {
        let all_plans = max_plans > 1;
        let body = json!({
            "query": query,
            "bindVars": bind_vars,
            "options": {"allPlans": all_plans, "maxNumberOfPlans": max_plans},
        });
        let response = self.request(Method::POST, "explain", Some(&body)).await?;
        let plans = if all_plans {
            response["plans"].as_array().cloned().unwrap_or_default()
        } else {
            response
                .get("plan")
                .filter(|p| !p.is_null())
                .cloned()
                .map(|p| vec![p])
                .unwrap_or_default()
        };
        Ok(json!({
            "plans": plans,
            "warnings": response.get("warnings").cloned().unwrap_or_else(|| json!([])),
            "stats": response.get("stats").cloned().unwrap_or_else(|| json!({})),
        }))
    }

    // ---- Collections ----

    /// Non-system collection descriptors.
    pub async fn list_collections(&self) -> DbResult<Vec<Value>> {
        let response = self
            .request(Method::GET, "collection?excludeSystem=true", None)
            .await?;
        Ok(response["result"].as_array().cloned().unwrap_or_default())
    }

    pub async fn has_collection(&self, name: &str) -> DbResult<bool> {
        Ok(self
            .request_opt(Method::GET, &format!("collection/{name}"), None)
            .await?
            .is_some())
    }

    /// Create a collection; `edge` selects the collection type.
    pub async fn create_collection(
        &self,
        name: &str,
        edge: bool,
        wait_for_sync: Option<bool>,
    ) -> DbResult<Value> {
        let mut body = json!({
            "name": name,
            "type": if edge { COLLECTION_TYPE_EDGE } else { COLLECTION_TYPE_DOCUMENT },
        });
        if let Some(sync) = wait_for_sync {
            body["waitForSync"] = json!(sync);
        }
        self.request(Method::POST, "collection", Some(&body)).await
    }

    pub async fn collection_properties(&self, name: &str) -> DbResult<Value> {
        self.request(Method::GET, &format!("collection/{name}/properties"), None)
            .await
    }

    pub async fn collection_count(&self, name: &str) -> DbResult<i64> {
        let response = self
            .request(Method::GET, &format!("collection/{name}/count"), None)
            .await?;
        Ok(response["count"].as_i64().unwrap_or(0))
    }

    // ---- Documents ----

    pub async fn insert_document(&self, collection: &str, document: &Value) -> DbResult<Value> {
        self.request(
            Method::POST,
            &format!("document/{collection}"),
            Some(document),
        )
        .await
    }

    /// Insert a batch of documents; per-document outcomes are returned in
    /// order, with error entries for rejected documents.
    pub async fn insert_documents(&self, collection: &str, documents: &[Value]) -> DbResult<Vec<Value>> {
        let body = Value::Array(documents.to_vec());
        let (status, value) = self
            .send(Method::POST, &format!("document/{collection}"), Some(&body))
            .await?;
        match value {
            Value::Array(results) => Ok(results),
            other => {
                if is_api_error(&other) || !status.is_success() {
                    Err(api_error(status, &other))
                } else {
                    Err(DbError::response("Expected an array of insert results"))
                }
            }
        }
    }

    /// Insert with overwrite semantics: replaces an existing document with
    /// the same `_key`.
    pub async fn upsert_document(&self, collection: &str, document: &Value) -> DbResult<Value> {
        self.request(
            Method::POST,
            &format!("document/{collection}?overwrite=true"),
            Some(document),
        )
        .await
    }

    /// Fetch a document by key, `None` when it does not exist.
    pub async fn get_document(&self, collection: &str, key: &str) -> DbResult<Option<Value>> {
        self.request_opt(Method::GET, &format!("document/{collection}/{key}"), None)
            .await
    }

    pub async fn update_document(
        &self,
        collection: &str,
        key: &str,
        update: &Value,
    ) -> DbResult<Value> {
        self.request(
            Method::PATCH,
            &format!("document/{collection}/{key}?keepNull=true&mergeObjects=true"),
            Some(update),
        )
        .await
    }

    /// Update a batch of documents, each carrying its `_key`.
    pub async fn update_documents(&self, collection: &str, updates: &[Value]) -> DbResult<Vec<Value>> {
        let body = Value::Array(updates.to_vec());
        let (status, value) = self
            .send(
                Method::PATCH,
                &format!("document/{collection}?keepNull=true&mergeObjects=true"),
                Some(&body),
            )
            .await?;
        match value {
            Value::Array(results) => Ok(results),
            other => {
                if is_api_error(&other) || !status.is_success() {
                    Err(api_error(status, &other))
                } else {
                    Err(DbError::response("Expected an array of update results"))
                }
            }
        }
    }

    pub async fn remove_document(&self, collection: &str, key: &str) -> DbResult<Value> {
        self.request(Method::DELETE, &format!("document/{collection}/{key}"), None)
            .await
    }

    // ---- Indexes ----

    pub async fn list_indexes(&self, collection: &str) -> DbResult<Vec<Value>> {
        let response = self
            .request(Method::GET, &format!("index?collection={collection}"), None)
            .await?;
        Ok(response["indexes"].as_array().cloned().unwrap_or_default())
    }

    /// Create an index; `definition` carries the type-specific fields.
    pub async fn create_index(&self, collection: &str, definition: &Value) -> DbResult<Value> {
        self.request(
            Method::POST,
            &format!("index?collection={collection}"),
            Some(definition),
        )
        .await
    }

    /// Delete an index by its full id, e.g. `users/12345`.
    pub async fn delete_index(&self, index_id: &str) -> DbResult<Value> {
        self.request(Method::DELETE, &format!("index/{index_id}"), None)
            .await
    }

    // ---- Graphs ----

    pub async fn list_graphs(&self) -> DbResult<Vec<Value>> {
        let response = self.request(Method::GET, "gharial", None).await?;
        Ok(response["graphs"].as_array().cloned().unwrap_or_default())
    }

    pub async fn has_graph(&self, name: &str) -> DbResult<bool> {
        Ok(self
            .request_opt(Method::GET, &format!("gharial/{name}"), None)
            .await?
            .is_some())
    }

    /// Create a named graph from edge definitions in API format
    /// (`collection`, `from`, `to`).
    pub async fn create_graph(&self, name: &str, edge_definitions: &[Value]) -> DbResult<Value> {
        let body = json!({"name": name, "edgeDefinitions": edge_definitions});
        self.request(Method::POST, "gharial", Some(&body)).await
    }

    pub async fn add_vertex_collection(&self, graph: &str, collection: &str) -> DbResult<Value> {
        let body = json!({"collection": collection});
        self.request(Method::POST, &format!("gharial/{graph}/vertex"), Some(&body))
            .await
    }

    pub async fn add_edge_definition(
        &self,
        graph: &str,
        edge_collection: &str,
        from: &[String],
        to: &[String],
    ) -> DbResult<Value> {
        let body = json!({"collection": edge_collection, "from": from, "to": to});
        self.request(Method::POST, &format!("gharial/{graph}/edge"), Some(&body))
            .await
    }
}

/// Whether an ArangoDB response body carries the API error flag.
fn is_api_error(value: &Value) -> bool {
    value.get("error").and_then(Value::as_bool).unwrap_or(false)
}

/// Map an ArangoDB error body (or bare HTTP status) to a `DbError`.
fn api_error(status: StatusCode, value: &Value) -> DbError {
    let message = value["errorMessage"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {status}"));
    DbError::operation(message, value["errorNum"].as_i64())
}

/// Drain the `result` rows out of a cursor response.
fn take_rows(response: &mut Value) -> Vec<Value> {
    match response.get_mut("result").map(Value::take) {
        Some(Value::Array(rows)) => rows,
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ConnectionConfig {
        ConnectionConfig {
            url: "http://localhost:8529/".to_string(),
            database: "_system".to_string(),
            username: "root".to_string(),
            password: "secret".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_client_builds_without_io() {
        let client = ArangoClient::new(&test_config()).unwrap();
        assert_eq!(client.database(), "_system");
    }

    #[test]
    fn test_api_url_strips_trailing_slash() {
        let client = ArangoClient::new(&test_config()).unwrap();
        assert_eq!(
            client.api_url("cursor"),
            "http://localhost:8529/_db/_system/_api/cursor"
        );
    }

    #[test]
    fn test_api_error_prefers_body_message() {
        let body = json!({"error": true, "errorMessage": "collection not found", "errorNum": 1203});
        let err = api_error(StatusCode::NOT_FOUND, &body);
        assert!(err.to_string().contains("collection not found"));
        assert_eq!(err.error_num(), Some(1203));
    }

    #[test]
    fn test_api_error_falls_back_to_status() {
        let err = api_error(StatusCode::BAD_GATEWAY, &Value::Null);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_is_api_error_flag() {
        assert!(is_api_error(&json!({"error": true})));
        assert!(!is_api_error(&json!({"error": false})));
        assert!(!is_api_error(&json!({"result": []})));
    }

    #[test]
    fn test_take_rows_drains_result() {
        let mut response = json!({"result": [1, 2], "hasMore": false});
        let rows = take_rows(&mut response);
        assert_eq!(rows, vec![json!(1), json!(2)]);
    }
}
