//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::ws::{Message as AxumMessage, WebSocketUpgrade},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use futures_util::{SinkExt, StreamExt};
use rotary_proxy::net::SessionTracker;
use rotary_proxy::observability::SpanHook;
use rotary_proxy::{HttpServer, ProxyConfig, Shutdown, TargetSet};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// A proxy running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub sessions: SessionTracker,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

/// Serve `router` on an ephemeral port.
pub async fn start_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Self-signed certificate issued for `backend.invalid`, so it fails both
/// chain and hostname verification against 127.0.0.1.
pub const BACKEND_CERT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/backend.pem");
pub const BACKEND_KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/backend-key.pem");

/// Serve `router` over TLS with the self-signed test certificate.
pub async fn start_tls_backend(router: Router) -> SocketAddr {
    let tls = RustlsConfig::from_pem_file(BACKEND_CERT, BACKEND_KEY).await.unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum_server::from_tcp_rustls(listener, tls)
            .serve(router.into_make_service())
            .await
            .unwrap();
    });
    addr
}

/// Axum router echoing WebSocket text and binary frames on any path.
pub fn ws_echo_router() -> Router {
    Router::new().route("/{*path}", get(|upgrade: WebSocketUpgrade| async move {
        upgrade.on_upgrade(|mut socket| async move {
            while let Some(Ok(message)) = socket.recv().await {
                match message {
                    AxumMessage::Text(_) | AxumMessage::Binary(_) => {
                        if socket.send(message).await.is_err() {
                            return;
                        }
                    }
                    AxumMessage::Close(_) => return,
                    _ => {}
                }
            }
        })
    }))
}

/// WebSocket backend echoing text and binary frames.
///
/// Receiving the text frame `die` drops the connection without a close
/// frame.
pub async fn start_ws_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(message)) = ws.next().await {
                    match message {
                        Message::Text(ref text) if text.as_str() == "die" => return,
                        Message::Text(_) | Message::Binary(_) => {
                            if ws.send(message).await.is_err() {
                                return;
                            }
                        }
                        Message::Close(_) => return,
                        _ => {}
                    }
                }
            });
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn http_targets(addrs: &[SocketAddr]) -> Vec<String> {
    addrs.iter().map(|a| format!("http://{}", a)).collect()
}

pub fn https_targets(addrs: &[SocketAddr]) -> Vec<String> {
    addrs.iter().map(|a| format!("https://{}", a)).collect()
}

pub async fn start_proxy(targets: Vec<String>) -> TestProxy {
    start_proxy_with(ProxyConfig::default(), targets, None).await
}

/// Start a proxy with a custom config and, optionally, a span hook.
pub async fn start_proxy_with(
    config: ProxyConfig,
    targets: Vec<String>,
    hook: Option<Arc<dyn SpanHook>>,
) -> TestProxy {
    let targets = TargetSet::parse(targets).unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = match hook {
        Some(hook) => HttpServer::with_span_hook(config, targets, hook).unwrap(),
        None => HttpServer::new(config, targets).unwrap(),
    };
    let sessions = server.sessions();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, None, server_shutdown).await;
    });

    TestProxy {
        addr,
        shutdown,
        sessions,
    }
}

/// Client that talks to the proxy directly and never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
