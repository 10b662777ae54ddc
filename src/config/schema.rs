//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Capabilities that are either on or off are enums, so a setting such as
//! "TLS on without a certificate" cannot be expressed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Backend base URLs, in round-robin order.
    /// When empty, targets are read from `targets_file`.
    pub targets: Vec<String>,

    /// JSON file holding `{"targets": [...]}`.
    pub targets_file: TargetsFile,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Security settings.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Startup and shutdown settings.
    pub lifecycle: LifecycleConfig,
}

/// Path of the targets file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TargetsFile(pub PathBuf);

impl Default for TargetsFile {
    fn default() -> Self {
        Self(PathBuf::from("targets.json"))
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:7500").
    pub bind_address: String,

    /// TLS termination for inbound connections.
    pub tls: ListenerTls,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7500".to_string(),
            tls: ListenerTls::Off,
        }
    }
}

/// Inbound TLS mode.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ListenerTls {
    /// Plain HTTP.
    #[default]
    Off,
    /// HTTPS using a PEM certificate chain and private key.
    On {
        #[serde(default = "default_cert_path")]
        cert_path: PathBuf,
        #[serde(default = "default_key_path")]
        key_path: PathBuf,
    },
}

impl ListenerTls {
    /// TLS on with the default `./server.pem` and `./server-key.pem` files.
    pub fn default_on() -> Self {
        ListenerTls::On {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, ListenerTls::On { .. })
    }
}

fn default_cert_path() -> PathBuf {
    PathBuf::from("./server.pem")
}

fn default_key_path() -> PathBuf {
    PathBuf::from("./server-key.pem")
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Certificate verification for https/wss targets.
    pub tls: UpstreamTls,

    /// Maximum redirects followed per request.
    pub max_redirects: usize,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            tls: UpstreamTls::Insecure,
            max_redirects: 10,
            connect_timeout_secs: 10,
        }
    }
}

/// Certificate verification for outbound TLS.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UpstreamTls {
    /// Standard certificate chain and hostname verification.
    Verify,
    /// Accept any certificate and hostname presented by a target.
    #[default]
    Insecure,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until response headers are produced, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per second per client IP.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: 50_000,
            burst_size: 50_000,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Answer CORS preflights and allow every origin.
    pub cors_enabled: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Request and forwarding spans.
    pub tracing: TracingMode,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
            tracing: TracingMode::Off,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TracingMode {
    #[default]
    Off,
    On,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub output: LogOutput,
}

/// Where log lines are written.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    /// Append to a file that is truncated on a fixed interval.
    File {
        #[serde(default = "default_log_path")]
        path: PathBuf,
        #[serde(default = "default_truncate_interval")]
        truncate_interval_mins: u64,
    },
}

impl LogOutput {
    /// File output at `rotary-proxy.log`, cleared every 2 minutes.
    pub fn default_file() -> Self {
        LogOutput::File {
            path: default_log_path(),
            truncate_interval_mins: default_truncate_interval(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("rotary-proxy.log")
}

fn default_truncate_interval() -> u64 {
    2
}

/// Startup and shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time in-flight connections get to finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 30,
        }
    }
}
