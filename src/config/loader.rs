//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::schema::ProxyConfig;
use crate::config::validation::ValidationError;
use crate::load_balancer::{TargetError, TargetSet};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    TargetsIo(std::path::PathBuf, std::io::Error),
    TargetsParse(serde_json::Error),
    Targets(TargetError),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::TargetsIo(path, e) => {
                write!(f, "Error opening targets file {}: {}", path.display(), e)
            }
            ConfigError::TargetsParse(e) => write!(f, "Error decoding targets file: {}", e),
            ConfigError::Targets(e) => write!(f, "Invalid targets: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) | ConfigError::TargetsIo(_, e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::TargetsParse(e) => Some(e),
            ConfigError::Targets(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

impl From<TargetError> for ConfigError {
    fn from(e: TargetError) -> Self {
        ConfigError::Targets(e)
    }
}

/// On-disk shape of the targets file.
#[derive(Debug, Deserialize)]
struct TargetsDocument {
    targets: Vec<String>,
}

/// Load a TOML file without semantic validation.
///
/// Callers apply command-line overrides; startup then runs
/// [`validate_config`](crate::config::validation::validate_config).
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Parse a targets document (`{"targets": [...]}`).
pub fn parse_targets_json(content: &str) -> Result<TargetSet, ConfigError> {
    let doc: TargetsDocument = serde_json::from_str(content).map_err(ConfigError::TargetsParse)?;
    Ok(TargetSet::parse(doc.targets)?)
}

/// Resolve the target set for a configuration.
///
/// Inline `targets` win; otherwise `targets_file` is read.
pub fn load_targets(config: &ProxyConfig) -> Result<TargetSet, ConfigError> {
    if !config.targets.is_empty() {
        return Ok(TargetSet::parse(&config.targets)?);
    }

    let path = &config.targets_file.0;
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::TargetsIo(path.clone(), e))?;
    parse_targets_json(&content)
}
