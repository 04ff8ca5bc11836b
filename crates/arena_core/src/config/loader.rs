//! Run configuration files.
//!
//! The format follows the file extension: `.toml`, `.json`, `.yaml`/`.yml`.
//! Every load validates the result before returning it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

use super::RunConfig;

/// Environment variable consulted when no explicit path is given.
pub const RUN_CONFIG_ENV: &str = "ARENA_RUN_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Explicit path if given, otherwise `$ARENA_RUN_CONFIG`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match env::var(RUN_CONFIG_ENV) {
        Ok(p) if !p.trim().is_empty() => Ok(PathBuf::from(p)),
        _ => Err(ConfigError::MissingPath { env: RUN_CONFIG_ENV }),
    }
}

/// Read, parse and validate a run configuration.
pub fn load_run_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let format = Format::of(path)?;
    let content = fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
    let config = parse_run_config(&content, format)?;
    config.validate()?;
    debug!(path = %path.display(), "run config loaded");
    Ok(config)
}

fn parse_run_config(content: &str, format: Format) -> Result<RunConfig, ConfigError> {
    match format {
        Format::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
    }
}

/// Write `config` to `path`, format by extension.
pub fn save_run_config(config: &RunConfig, path: &Path) -> Result<(), ConfigError> {
    let text = match Format::of(path)? {
        Format::Toml => config.to_toml_string()?,
        Format::Json => {
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialization(e.to_string()))?
        }
        Format::Yaml => serde_yaml::to_string(config).map_err(|e| ConfigError::Serialization(e.to_string()))?,
    };
    fs::write(path, text).map_err(|source| ConfigError::Io { path: path.display().to_string(), source })
}
