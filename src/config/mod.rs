//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file from CLOUDNATIVE_CONFIG)
//!     → validation.rs (semantic checks)
//!     → loader.rs (env overrides: MONGO_URI)
//!     → AppConfig (immutable, handed to startup)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - The listen port is fixed and is not part of the config

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AppConfig, DatastoreConfig, HttpConfig, LogFormat, ObservabilityConfig, ShutdownConfig,
};
