//! Startup orchestration.
//!
//! Subsystems come up in dependency order and the listener is bound last,
//! so traffic only arrives once targets, TLS and the outbound client are
//! ready.

use std::io;
use std::net::{AddrParseError, SocketAddr, TcpListener};
use std::time::Duration;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

use crate::config::loader::{load_targets, ConfigError};
use crate::config::validation::validate_config;
use crate::config::{LogOutput, ProxyConfig, UpstreamTls};
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::signals::spawn_signal_listener;
use crate::lifecycle::Shutdown;
use crate::net::tls::load_tls_config;
use crate::observability::logging::{init_logging, spawn_log_truncation, LoggingError};
use crate::observability::metrics::init_metrics;

/// Anything that stops the proxy from coming up.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Logging(#[from] LoggingError),

    #[error("error loading TLS certificate: {0}")]
    Tls(#[source] io::Error),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Start the proxy and block until it has shut down.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let log_file = init_logging(&config.observability, &config.logging.output)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rotary-proxy starting");

    if config.upstream.tls == UpstreamTls::Insecure {
        tracing::warn!("Certificate verification for targets is disabled");
    }

    let targets = load_targets(&config)?;
    for (index, target) in targets.iter().enumerate() {
        tracing::info!(index, target = %target, "Loaded target");
    }

    let tls = load_tls_config(&config.listener.tls)
        .await
        .map_err(StartupError::Tls)?;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).map_err(|source| {
        StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        }
    })?;
    tracing::info!(
        address = %listener.local_addr()?,
        tls = tls.is_some(),
        tracing = ?config.observability.tracing,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    if let (Some(file), LogOutput::File { truncate_interval_mins, .. }) =
        (log_file, &config.logging.output)
    {
        spawn_log_truncation(
            file,
            Duration::from_secs(truncate_interval_mins * 60),
            shutdown.subscribe(),
        );
    }

    let server = HttpServer::new(config, targets)?;
    server.run(listener, tls, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
