//! Request and forwarding spans.
//!
//! The HTTP layer calls a [`SpanHook`] at three points: when an inbound
//! request arrives, when one outbound attempt starts, and when that attempt
//! finishes. Which hook is used is decided once at startup.

use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode, Uri};
use tracing::{field, Span};
use url::Url;
use uuid::Uuid;

use crate::config::TracingMode;

/// Span lifecycle used by the forwarding core.
pub trait SpanHook: Send + Sync + fmt::Debug {
    /// Span covering the handling of one inbound request.
    fn begin_request(&self, method: &Method, uri: &Uri) -> Span;

    /// Record the status sent back to the client.
    fn end_request(&self, request: &Span, status: StatusCode);

    /// Span covering one outbound forwarding attempt.
    fn begin_attempt(&self, request: &Span, target: &Url) -> Span;

    /// Close an attempt span, recording the backend status when one arrived.
    fn end_attempt(&self, attempt: Span, status: Option<StatusCode>);
}

/// Hook for `TracingMode::Off`: every span is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl SpanHook for NoopHook {
    fn begin_request(&self, _method: &Method, _uri: &Uri) -> Span {
        Span::none()
    }

    fn end_request(&self, _request: &Span, _status: StatusCode) {}

    fn begin_attempt(&self, _request: &Span, _target: &Url) -> Span {
        Span::none()
    }

    fn end_attempt(&self, _attempt: Span, _status: Option<StatusCode>) {}
}

/// Hook for `TracingMode::On`: emits `tracing` spans tagged with a request id.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl SpanHook for TracingHook {
    fn begin_request(&self, method: &Method, uri: &Uri) -> Span {
        tracing::info_span!(
            "proxy_request",
            id = %Uuid::new_v4(),
            method = %method,
            path = %uri.path(),
            response = field::Empty,
        )
    }

    fn end_request(&self, request: &Span, status: StatusCode) {
        request.record("response", status.as_u16());
    }

    fn begin_attempt(&self, request: &Span, target: &Url) -> Span {
        tracing::info_span!(
            parent: request,
            "proxy_forward",
            target = %target,
            response = field::Empty,
        )
    }

    fn end_attempt(&self, attempt: Span, status: Option<StatusCode>) {
        if let Some(status) = status {
            attempt.record("response", status.as_u16());
        }
        // Dropping the last handle closes the span.
        drop(attempt);
    }
}

/// Select the hook for a tracing mode.
pub fn span_hook(mode: TracingMode) -> Arc<dyn SpanHook> {
    match mode {
        TracingMode::Off => Arc::new(NoopHook),
        TracingMode::On => Arc::new(TracingHook),
    }
}
