//! Shared database connection management.
//!
//! The server holds exactly one [`ArangoClient`] handle at a time, shared
//! behind a `tokio::sync::RwLock`. Startup connects with bounded retries but
//! never refuses to start when the database is down; each dispatch that finds
//! no cached handle makes a single lazy reconnect attempt.

use crate::db::client::{ArangoClient, ConnectionConfig};
use crate::error::{DbError, DbResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns the shared, optional database handle.
#[derive(Debug)]
pub struct ConnectionManager {
    config: ConnectionConfig,
    handle: RwLock<Option<Arc<ArangoClient>>>,
    /// Total underlying connect attempts, successful or not.
    attempts: AtomicU64,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            handle: RwLock::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    /// Build a manager that already holds a handle. Used by tests to inject
    /// a fabricated client without any network traffic.
    pub fn with_handle(config: ConnectionConfig, client: Arc<ArangoClient>) -> Self {
        Self {
            config,
            handle: RwLock::new(Some(client)),
            attempts: AtomicU64::new(0),
        }
    }

    /// Number of connect attempts made so far.
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Whether a handle is currently cached.
    pub async fn is_connected(&self) -> bool {
        self.handle.read().await.is_some()
    }

    async fn try_connect(&self) -> DbResult<Arc<ArangoClient>> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let client = ArangoClient::connect(&self.config).await?;
        Ok(Arc::new(client))
    }

    /// Connect with bounded retries at startup.
    ///
    /// `max_attempts` is normalized to at least 1. On exhaustion the handle
    /// stays absent and the server keeps running; dispatches will reconnect
    /// lazily once the database comes back.
    pub async fn connect_with_retry(&self, max_attempts: u32, delay: Duration) {
        let max_attempts = max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.try_connect().await {
                Ok(client) => {
                    if let Some(version) = client.server_version().await {
                        info!(server_version = %version, attempt, "Database connection established");
                    } else {
                        info!(attempt, "Database connection established");
                    }
                    *self.handle.write().await = Some(client);
                    return;
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "Database connection attempt failed"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        warn!(
            max_attempts,
            "Starting without a database connection; will reconnect on demand"
        );
    }

    /// Return the cached handle, or make exactly one reconnect attempt.
    pub async fn acquire(&self) -> DbResult<Arc<ArangoClient>> {
        if let Some(client) = self.handle.read().await.as_ref() {
            return Ok(Arc::clone(client));
        }
        debug!("No cached database handle; attempting reconnect");
        match self.try_connect().await {
            Ok(client) => {
                *self.handle.write().await = Some(Arc::clone(&client));
                info!("Database connection re-established");
                Ok(client)
            }
            Err(err) => {
                warn!(error = %err, "Lazy reconnect failed");
                Err(DbError::connection(err.to_string()))
            }
        }
    }

    /// Drop the cached handle. Best-effort; the underlying HTTP client
    /// releases its resources when the last clone is dropped.
    pub async fn close(&self) {
        let mut guard = self.handle.write().await;
        if guard.take().is_some() {
            info!("Database connection closed");
        }
    }
}
