//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `datastore.uri` verbatim when set and non-empty.
pub const MONGO_URI_ENV: &str = "MONGO_URI";

/// Optional path to a TOML config file.
pub const CONFIG_PATH_ENV: &str = "CLOUDNATIVE_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration the way the binary does at startup.
///
/// Reads the file named by `CLOUDNATIVE_CONFIG` if set, otherwise starts from
/// defaults, then applies environment overrides.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Same as [`load_from_env`] but with an injectable variable lookup.
pub fn load_with<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_ENV) {
        Some(path) => load_config(Path::new(&path))?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, lookup);
    Ok(config)
}

/// Apply environment overrides on top of a loaded config.
///
/// A non-empty `MONGO_URI` replaces the datastore URI exactly as given. An
/// empty value counts as unset.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(uri) = lookup(MONGO_URI_ENV).filter(|v| !v.is_empty()) {
        config.datastore.uri = uri;
    }
}
