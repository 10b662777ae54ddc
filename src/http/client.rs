//! Outbound clients.
//!
//! One `reqwest::Client` serves every plain request and every WebSocket
//! handshake probe. It keeps a connection pool per target, so it is built
//! once at startup and shared.

use std::time::Duration;

use reqwest::redirect;

use crate::config::{UpstreamConfig, UpstreamTls};
use crate::http::error::RedirectLimit;

/// Build the shared outbound HTTP client.
pub fn build_client(config: &UpstreamConfig) -> reqwest::Result<reqwest::Client> {
    let insecure = config.tls == UpstreamTls::Insecure;

    reqwest::Client::builder()
        .redirect(redirect_policy(config.max_redirects))
        .danger_accept_invalid_certs(insecure)
        .danger_accept_invalid_hostnames(insecure)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
}

/// Follow up to `max` redirects, then fail the request.
fn redirect_policy(max: usize) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        let hops = attempt.previous().len();
        if hops > max {
            return attempt.error(RedirectLimit(max));
        }
        tracing::debug!(location = %attempt.url(), hops, "Following redirect");
        attempt.follow()
    })
}

/// TLS connector used when dialing `wss://` targets.
pub fn websocket_tls(tls: UpstreamTls) -> Result<native_tls::TlsConnector, native_tls::Error> {
    let insecure = tls == UpstreamTls::Insecure;
    native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(insecure)
        .danger_accept_invalid_hostnames(insecure)
        .build()
}
