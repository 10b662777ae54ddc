//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Check that TLS material exists when TLS is requested
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Target URLs are validated by the target loader, not here

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::schema::{ListenerTls, LogOutput, ProxyConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBindAddress(String),
    InvalidMetricsAddress(String),
    MissingTlsFile { kind: &'static str, path: PathBuf },
    ZeroRateLimit,
    ZeroTruncateInterval,
    ZeroRequestTimeout,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address {:?} is not a socket address", addr)
            }
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "observability.metrics_address {:?} is not a socket address", addr)
            }
            ValidationError::MissingTlsFile { kind, path } => {
                write!(f, "TLS {} file not found: {}", kind, path.display())
            }
            ValidationError::ZeroRateLimit => {
                write!(f, "rate_limit.requests_per_second and burst_size must be > 0")
            }
            ValidationError::ZeroTruncateInterval => {
                write!(f, "logging.output.truncate_interval_mins must be > 0")
            }
            ValidationError::ZeroRequestTimeout => write!(f, "timeouts.request_secs must be > 0"),
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let ListenerTls::On { cert_path, key_path } = &config.listener.tls {
        if !cert_path.exists() {
            errors.push(ValidationError::MissingTlsFile {
                kind: "certificate",
                path: cert_path.clone(),
            });
        }
        if !key_path.exists() {
            errors.push(ValidationError::MissingTlsFile {
                kind: "private key",
                path: key_path.clone(),
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.rate_limit.enabled
        && (config.rate_limit.requests_per_second == 0 || config.rate_limit.burst_size == 0)
    {
        errors.push(ValidationError::ZeroRateLimit);
    }

    if let LogOutput::File { truncate_interval_mins: 0, .. } = config.logging.output {
        errors.push(ValidationError::ZeroTruncateInterval);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
