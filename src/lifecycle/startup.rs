//! Startup orchestration.
//!
//! # Order
//! 1. Start the datastore attempt (returns immediately)
//! 2. Install the metrics exporter, if enabled
//! 3. Bind `[::]:3000`, or `0.0.0.0:3000` without IPv6; failure here is fatal
//! 4. Log readiness and serve until a shutdown signal
//! 5. Drain for at most the configured grace period
//!
//! The listener never waits on the datastore.

use std::future::Future;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;

use crate::config::AppConfig;
use crate::datastore::{Datastore, MongoConnector};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;

/// The port the server listens on, on every interface. Not configurable.
pub const LISTEN_PORT: u16 = 3000;

/// Fatal startup and serving errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Failed to install metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("Server task failed: {0}")]
    Task(#[from] JoinError),
}

/// Run the application until SIGINT/SIGTERM.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    let datastore = Datastore::connect(MongoConnector::new(&config.datastore), &config.datastore);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = bind_unspecified(LISTEN_PORT).await?;
    serve(&config, datastore, listener, shutdown_signal()).await
}

/// Bind the TCP listener.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, StartupError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })
}

/// Bind `port` on all interfaces.
///
/// Tries the IPv6 wildcard first, which also accepts IPv4 clients on a
/// dual-stack host. Falls back to `0.0.0.0` when the host has no IPv6. A port
/// already in use is reported as is, without the fallback.
pub async fn bind_unspecified(port: u16) -> Result<TcpListener, StartupError> {
    let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
    match TcpListener::bind(v6).await {
        Ok(listener) => Ok(listener),
        Err(source) if source.kind() == ErrorKind::AddrInUse => {
            Err(StartupError::Bind { addr: v6, source })
        }
        Err(e) => {
            tracing::debug!(error = %e, "IPv6 wildcard unavailable, binding IPv4 only");
            bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
        }
    }
}

/// Serve on an already bound listener until `signal` resolves, then drain.
pub async fn serve<H, F>(
    config: &AppConfig,
    datastore: Datastore<H>,
    listener: TcpListener,
    signal: F,
) -> Result<(), StartupError>
where
    H: Clone + Send + Sync + 'static,
    F: Future<Output = ()> + Send,
{
    let port = listener.local_addr().map_err(StartupError::Serve)?.port();
    tracing::info!(port, "Server is running on port {}", port);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, datastore);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => return result?.map_err(StartupError::Serve),
        _ = signal => {}
    }

    let listening = shutdown.trigger();
    tracing::info!(receivers = listening, "Shutdown signal received, draining");

    let grace = Duration::from_secs(config.shutdown.grace_period_secs);
    match tokio::time::timeout(grace, &mut server_task).await {
        Ok(result) => result?.map_err(StartupError::Serve),
        Err(_) => {
            tracing::warn!(
                grace_period_secs = config.shutdown.grace_period_secs,
                "Graceful shutdown timed out, closing remaining connections"
            );
            server_task.abort();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let err = bind(addr).await.unwrap_err();
        assert!(matches!(err, StartupError::Bind { addr: a, .. } if a == addr));
        assert!(err.to_string().starts_with(&format!("Failed to bind {addr}")));
    }

    #[tokio::test]
    async fn wildcard_bind_accepts_loopback_clients() {
        let listener = bind_unspecified(0).await.unwrap();
        let local = listener.local_addr().unwrap();
        assert!(local.ip().is_unspecified());

        let loopback = if local.is_ipv6() {
            SocketAddr::from((Ipv6Addr::LOCALHOST, local.port()))
        } else {
            SocketAddr::from((Ipv4Addr::LOCALHOST, local.port()))
        };
        let (client, accepted) =
            tokio::join!(tokio::net::TcpStream::connect(loopback), listener.accept());
        client.unwrap();
        accepted.unwrap();
    }
}
