//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber (filter, format, writer)
//! - Optionally write to a log file that is cleared on an interval
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - The log file is opened in append mode, so truncating it from another
//!   handle never leaves a gap of zero bytes in front of new lines

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer, Registry,
};

use crate::config::schema::{LogFormat, LogOutput, ObservabilityConfig};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("error opening log file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber.
///
/// Returns the shared log file handle in file mode so the caller can
/// schedule truncation.
pub fn init_logging(
    observability: &ObservabilityConfig,
    output: &LogOutput,
) -> Result<Option<Arc<File>>, LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("rotary_proxy={0},tower_http={0}", observability.log_level).into()
    });

    let (layer, file) = match output {
        LogOutput::Stdout => (fmt_layer(observability.log_format, std::io::stdout, true), None),
        LogOutput::File { path, .. } => {
            let file = Arc::new(open_log_file(path)?);
            (fmt_layer(observability.log_format, file.clone(), false), Some(file))
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;

    Ok(file)
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Open (or create) the log file in append mode.
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// Clear the log file every `every` until shutdown.
pub fn spawn_log_truncation(
    file: Arc<File>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match file.set_len(0) {
                        Ok(()) => tracing::debug!("Log file truncated"),
                        Err(e) => tracing::warn!(error = %e, "Failed to truncate log file"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Log truncation stopped");
                    break;
                }
            }
        }
    })
}
