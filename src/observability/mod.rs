//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stdout or truncated log file)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (request and forwarding spans via SpanHook)
//!
//! Consumers:
//!     → Log aggregation (stdout, file)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Any tracing subscriber layer (e.g. an OpenTelemetry bridge)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Request ID flows to backends as an ordinary header
//! - Metrics are cheap (no-ops until a recorder is installed)
//! - Span hooks are optional; forwarding behaves the same without them

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::tracing::{span_hook, NoopHook, SpanHook, TracingHook};
