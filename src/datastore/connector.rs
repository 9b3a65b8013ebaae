//! Single-attempt connection and the shared datastore handle.
//!
//! # Responsibilities
//! - Start exactly one connection attempt without blocking the caller
//! - Log the outcome once (success or failure, never both)
//! - Publish the outcome so handlers can await it with their own timeout

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::DatastoreConfig;
use crate::datastore::types::{
    redact_uri, ConnectionState, ConnectionStatus, DatastoreError, DatastoreResult,
};
use crate::observability::metrics;

/// Something that can turn a connection string into a live client handle.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The client handle produced on success.
    type Handle: Clone + Send + Sync + 'static;

    /// Perform one connection attempt against `uri`.
    async fn connect(&self, uri: &str) -> DatastoreResult<Self::Handle>;
}

/// Shared handle to the datastore.
///
/// Created once per process by [`Datastore::connect`] and passed explicitly to
/// whatever needs it. Cloning is cheap and every clone observes the same
/// connection attempt.
#[derive(Debug, Clone)]
pub struct Datastore<H> {
    uri: Arc<str>,
    state: watch::Receiver<ConnectionState<H>>,
}

impl<H> Datastore<H>
where
    H: Clone + Send + Sync + 'static,
{
    /// Start the connection attempt in the background and return immediately.
    ///
    /// The attempt is made exactly once. A failure is logged and recorded but
    /// never retried.
    pub fn connect<C>(connector: C, config: &DatastoreConfig) -> Self
    where
        C: Connector<Handle = H>,
    {
        let uri: Arc<str> = Arc::from(config.uri.as_str());
        let (tx, rx) = watch::channel(ConnectionState::Pending);
        metrics::record_datastore_status(ConnectionStatus::Pending);

        let target = Arc::clone(&uri);
        tokio::spawn(async move {
            tracing::info!(uri = %redact_uri(&target), "Connecting to MongoDB");

            let next = match connector.connect(&target).await {
                Ok(handle) => {
                    tracing::info!("Connected to MongoDB");
                    ConnectionState::Connected(handle)
                }
                Err(e) => {
                    tracing::error!(error = %e, "MongoDB connection error");
                    ConnectionState::Failed(Arc::new(e))
                }
            };
            metrics::record_datastore_status(next.status());

            // Nobody listening is fine: the handle was dropped before we finished.
            let _ = tx.send(next);
        });

        Self { uri, state: rx }
    }

    /// Build a handle whose outcome is already known.
    pub fn from_state(uri: impl Into<Arc<str>>, state: ConnectionState<H>) -> Self {
        let (_tx, rx) = watch::channel(state);
        Self {
            uri: uri.into(),
            state: rx,
        }
    }

    /// The connection string the attempt targets.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState<H> {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.borrow().status()
    }

    /// Wait for the attempt to resolve, up to `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> DatastoreResult<H> {
        let mut rx = self.state.clone();
        let state = {
            let resolved = tokio::time::timeout(timeout, rx.wait_for(|s| !s.is_pending()))
                .await
                .map_err(|_| DatastoreError::Timeout(timeout))?
                .map_err(|_| DatastoreError::Abandoned)?;
            resolved.clone()
        };

        match state {
            ConnectionState::Connected(handle) => Ok(handle),
            ConnectionState::Failed(e) => Err(DatastoreError::Failed(e)),
            ConnectionState::Pending => Err(DatastoreError::Abandoned),
        }
    }
}
