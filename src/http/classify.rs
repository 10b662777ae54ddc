//! Request classification.
//!
//! A request is routed as a WebSocket upgrade only when `Upgrade` is
//! `websocket` and `Connection` is `Upgrade`. Both comparisons ignore case
//! and surrounding whitespace. Everything else is plain HTTP.

use axum::http::{
    header::{CONNECTION, UPGRADE},
    HeaderMap, HeaderName,
};

/// How an inbound request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Plain,
    WebSocket,
}

/// Classify a request by its headers.
pub fn classify(headers: &HeaderMap) -> RequestKind {
    if header_is(headers, UPGRADE, "websocket") && header_is(headers, CONNECTION, "upgrade") {
        RequestKind::WebSocket
    } else {
        RequestKind::Plain
    }
}

fn header_is(headers: &HeaderMap, name: HeaderName, expected: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn websocket_upgrade_any_case() {
        for (upgrade, connection) in [
            ("websocket", "Upgrade"),
            ("WebSocket", "upgrade"),
            ("WEBSOCKET", "UPGRADE"),
        ] {
            let map = headers(&[("upgrade", upgrade), ("connection", connection)]);
            assert_eq!(classify(&map), RequestKind::WebSocket, "{} / {}", upgrade, connection);
        }
    }

    #[test]
    fn other_upgrades_are_plain() {
        let map = headers(&[("upgrade", "h2c"), ("connection", "Upgrade")]);
        assert_eq!(classify(&map), RequestKind::Plain);

        let map = headers(&[("upgrade", "h2c")]);
        assert_eq!(classify(&map), RequestKind::Plain);
    }

    #[test]
    fn both_headers_required() {
        assert_eq!(classify(&headers(&[("upgrade", "websocket")])), RequestKind::Plain);
        assert_eq!(classify(&headers(&[("connection", "Upgrade")])), RequestKind::Plain);
        assert_eq!(classify(&HeaderMap::new()), RequestKind::Plain);
    }

    #[test]
    fn connection_must_equal_upgrade() {
        let map = headers(&[("upgrade", "websocket"), ("connection", "keep-alive")]);
        assert_eq!(classify(&map), RequestKind::Plain);
    }
}
