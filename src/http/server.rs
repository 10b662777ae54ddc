//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router: one catch-all handler for every method and path
//! - Wire middleware (tracing, request id, timeout, CORS, rate limit)
//! - Pick a target per request and dispatch by request kind
//! - Serve plain or TLS and drain on shutdown

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use thiserror::Error;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::http::classify::{classify, RequestKind};
use crate::http::client::{build_client, websocket_tls};
use crate::http::forward::forward_request;
use crate::http::websocket::WebSocketForwarder;
use crate::load_balancer::{LoadBalancer, RoundRobin, TargetSet};
use crate::net::SessionTracker;
use crate::observability::{metrics, span_hook, SpanHook};
use crate::security::{rate_limit_middleware, RateLimiterState};

/// Errors raised while assembling the server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to build upstream TLS connector: {0}")]
    Tls(#[from] native_tls::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub balancer: Arc<RoundRobin>,
    pub client: reqwest::Client,
    pub websocket: WebSocketForwarder,
    pub hook: Arc<dyn SpanHook>,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    sessions: SessionTracker,
}

impl HttpServer {
    /// Create a server for `targets`, using the span hook the config selects.
    pub fn new(config: ProxyConfig, targets: TargetSet) -> Result<Self, ServerError> {
        let hook = span_hook(config.observability.tracing);
        Self::with_span_hook(config, targets, hook)
    }

    /// Create a server with a caller-supplied span hook.
    pub fn with_span_hook(
        config: ProxyConfig,
        targets: TargetSet,
        hook: Arc<dyn SpanHook>,
    ) -> Result<Self, ServerError> {
        let client = build_client(&config.upstream)?;
        let sessions = SessionTracker::new();

        let websocket = WebSocketForwarder {
            client: client.clone(),
            tls: websocket_tls(config.upstream.tls)?,
            hook: Arc::clone(&hook),
            sessions: sessions.clone(),
        };

        let state = AppState {
            balancer: Arc::new(RoundRobin::new(targets)),
            client,
            websocket,
            hook,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            sessions,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state);

        if config.rate_limit.enabled {
            let limiter = Arc::new(RateLimiterState::new(&config.rate_limit));
            router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        if config.security.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Live relay sessions, shared with the handlers.
    pub fn sessions(&self) -> SessionTracker {
        self.sessions.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    ///
    /// Open connections get `lifecycle.shutdown_grace_secs` to finish.
    pub async fn run(
        self,
        listener: std::net::TcpListener,
        tls: Option<RustlsConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> io::Result<()> {
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let handle = Handle::new();
        let drain = handle.clone();
        let grace = Duration::from_secs(self.config.lifecycle.shutdown_grace_secs);
        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            // A closed channel also means the process is going down.
            let _ = shutdown.recv().await;
            tracing::info!(
                grace_secs = grace.as_secs(),
                active_sessions = sessions.active_count(),
                "Draining connections"
            );
            drain.graceful_shutdown(Some(grace));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        match tls {
            Some(tls) => {
                tracing::info!(address = %addr, "HTTPS server starting");
                axum_server::from_tcp_rustls(listener, tls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum_server::from_tcp(listener)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: pick the next target, then forward or relay.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let span = state.hook.begin_request(request.method(), request.uri());
    let kind = classify(request.headers());
    let target = state.balancer.next_target().clone();
    let method = request.method().to_string();

    tracing::debug!(
        method = %method,
        path = %request.uri().path(),
        target = %target,
        kind = ?kind,
        "Proxying request"
    );

    let response = match kind {
        RequestKind::WebSocket => {
            state
                .websocket
                .clone()
                .upgrade(target.clone(), request)
                .instrument(span.clone())
                .await
        }
        RequestKind::Plain => {
            let forwarded = forward_request(&state.client, state.hook.as_ref(), &target, request)
                .instrument(span.clone())
                .await;
            match forwarded {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(target = %target, error = %e, "Forwarding failed");
                    e.into_response()
                }
            }
        }
    };

    state.hook.end_request(&span, response.status());
    metrics::record_request(&method, response.status().as_u16(), &target.to_string(), start);
    response
}
