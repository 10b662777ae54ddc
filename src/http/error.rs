//! Errors scoped to a single request or relay session.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failure while forwarding one request. Never affects other requests.
#[derive(Error, Debug)]
pub enum ForwardError {
    /// The outbound URL could not be built from target and inbound path.
    #[error("failed to create request: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The redirect chain exceeded the configured limit.
    #[error("too many redirects: {0}")]
    TooManyRedirects(#[source] reqwest::Error),

    /// Transport failure while sending or receiving.
    #[error("failed to send request to target: {0}")]
    Upstream(#[source] reqwest::Error),

    /// The client-facing response could not be assembled.
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),

    /// The handshake URL has no WebSocket equivalent.
    #[error("cannot open a WebSocket to {0}")]
    WebSocketScheme(String),

    /// Dialing or handshaking the target WebSocket failed.
    #[error("failed to establish WebSocket connection to target: {0}")]
    Dial(#[from] tungstenite::Error),
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_redirect() {
            ForwardError::TooManyRedirects(e)
        } else {
            ForwardError::Upstream(e)
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let message = match self {
            ForwardError::TooManyRedirects(_) => "Too many redirects",
            ForwardError::InvalidUrl(_) | ForwardError::Response(_) => "Failed to forward request",
            _ => "Upstream request failed",
        };
        (StatusCode::BAD_GATEWAY, message).into_response()
    }
}

/// Returned by the redirect policy once the chain is too long.
#[derive(Error, Debug)]
#[error("stopped after {0} redirects")]
pub struct RedirectLimit(pub usize);

/// Failure on one side of an active relay session.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("client connection failed: {0}")]
    Client(#[source] axum::Error),

    #[error("target connection failed: {0}")]
    Target(#[source] tungstenite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarding_errors_map_to_bad_gateway() {
        let err = ForwardError::WebSocketScheme("ftp://x".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);

        let err: ForwardError = url::ParseError::EmptyHost.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
