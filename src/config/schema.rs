//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files. Every
//! field has a default so an empty file (or no file at all) is a valid config.

use serde::{Deserialize, Serialize};

/// Connection string used when `MONGO_URI` is not set.
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/cloudnative";

/// Root configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Document database settings.
    pub datastore: DatastoreConfig,

    /// HTTP request handling limits.
    pub http: HttpConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Datastore connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatastoreConfig {
    /// MongoDB connection string. Overridden by `MONGO_URI`.
    pub uri: String,

    /// Application name reported to the server in the handshake.
    pub app_name: String,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// How long the driver waits for a usable server, in seconds.
    pub server_selection_timeout_secs: u64,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            app_name: "cloudnative-app".to_string(),
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

/// HTTP request handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum JSON request body size in bytes.
    pub json_body_limit: usize,

    /// Total time allowed for a single request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            json_body_limit: 100 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time allowed for in-flight requests to drain after a signal.
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
