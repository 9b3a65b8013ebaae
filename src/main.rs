use cloudnative_app::config::{self, ObservabilityConfig};
use cloudnative_app::lifecycle;
use cloudnative_app::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!("cloudnative-app v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        request_timeout_secs = config.http.request_timeout_secs,
        json_body_limit = config.http.json_body_limit,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    if let Err(e) = lifecycle::run(config).await {
        tracing::error!(error = %e, "Server terminated");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
