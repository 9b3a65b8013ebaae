//! Route handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::datastore::{ConnectionState, ConnectionStatus};
use crate::http::server::AppState;

/// Body returned by `GET /`.
pub const GREETING: &str = "Cloud Native App is Running!";

/// `GET /`. Never touches the datastore.
pub async fn root() -> &'static str {
    GREETING
}

/// Liveness report with the datastore connection outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub datastore: ConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health`. Always 200 while the process serves; the datastore field
/// tells readiness apart.
pub async fn health<H>(State(state): State<AppState<H>>) -> Json<HealthReport>
where
    H: Clone + Send + Sync + 'static,
{
    let snapshot = state.datastore.state();
    let error = match &snapshot {
        ConnectionState::Failed(e) => Some(e.to_string()),
        _ => None,
    };

    Json(HealthReport {
        status: "ok".to_string(),
        datastore: snapshot.status(),
        error,
    })
}
