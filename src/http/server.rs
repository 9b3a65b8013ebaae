//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, metrics, timeout, body
//!   decompression, JSON bodies)
//! - Serve on a bound listener until the shutdown broadcast fires

use std::time::Duration;

use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    decompression::RequestDecompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, HttpConfig};
use crate::datastore::Datastore;
use crate::http::handlers;
use crate::http::json::{parse_json_body, JsonBodyConfig};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState<H> {
    pub datastore: Datastore<H>,
}

/// HTTP server for the application.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server sharing the given datastore handle.
    pub fn new<H>(config: &AppConfig, datastore: Datastore<H>) -> Self
    where
        H: Clone + Send + Sync + 'static,
    {
        let router = build_router(&config.http, AppState { datastore });
        Self { router }
    }

    /// The fully layered router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns once `shutdown` fires and in-flight requests have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router<H>(config: &HttpConfig, state: AppState<H>) -> Router
where
    H: Clone + Send + Sync + 'static,
{
    let json = JsonBodyConfig {
        limit: config.json_body_limit,
    };

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health::<H>))
        .with_state(state)
        .layer(from_fn_with_state(json, parse_json_body))
        .layer(RequestDecompressionLayer::new().pass_through_unaccepted(true))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(from_fn(metrics::track_requests))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id(request),
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
}
