//! WebSocket forwarding.
//!
//! # Data Flow
//! ```text
//! Client ──upgrade──→ Proxy
//!                       ├─ probe: mirrored request to the target (redirects followed)
//!                       ├─ dial: ws(s):// version of the URL the probe ended on
//!                       └─ relay: Client ←── frames ──→ Target
//! ```
//!
//! The client upgrade completes before the target is contacted. When the
//! target cannot be reached the already-upgraded client socket is dropped.
//! Text, binary and close frames cross in both directions. Ping and pong
//! are answered locally on each side.

use axum::{
    body::Body,
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        FromRequestParts, WebSocketUpgrade,
    },
    http::Request,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    tungstenite::{self, protocol::frame::coding::CloseCode},
    Connector, MaybeTlsStream, WebSocketStream,
};
use tracing::{Instrument, Span};
use url::Url;

use crate::http::error::{ForwardError, RelayError};
use crate::http::forward::{mirror_request, outbound_url};
use crate::load_balancer::Target;
use crate::net::SessionTracker;
use crate::observability::SpanHook;

/// Socket to the target.
pub type TargetSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Everything a relay task needs once the client is upgraded.
#[derive(Clone)]
pub struct WebSocketForwarder {
    pub client: reqwest::Client,
    pub tls: native_tls::TlsConnector,
    pub hook: Arc<dyn SpanHook>,
    pub sessions: SessionTracker,
}

impl WebSocketForwarder {
    /// Accept the client upgrade and relay to `target` in the background.
    ///
    /// Returns the 101 response, or the upgrade rejection if the request
    /// cannot be upgraded.
    pub async fn upgrade(self, target: Target, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();
        let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(upgrade) => upgrade,
            Err(rejection) => {
                tracing::warn!(target = %target, error = %rejection, "WebSocket upgrade rejected");
                return rejection.into_response();
            }
        };

        let inbound = Request::from_parts(parts, body);
        let span = Span::current();
        upgrade.on_upgrade(move |socket| {
            async move { self.serve(socket, target, inbound).await }.instrument(span)
        })
    }

    async fn serve(self, socket: WebSocket, target: Target, inbound: Request<Body>) {
        let upstream = match self.connect(&target, inbound).await {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "WebSocket connect to target failed");
                drop(socket);
                return;
            }
        };

        let guard = self.sessions.track();
        tracing::info!(session_id = %guard.id(), target = %target, "WebSocket session opened");

        match relay(socket, upstream).await {
            Ok(()) => {
                tracing::info!(session_id = %guard.id(), target = %target, "WebSocket session closed")
            }
            Err(e) => tracing::warn!(
                session_id = %guard.id(),
                target = %target,
                error = %e,
                "WebSocket session ended with error"
            ),
        }
    }

    /// Probe the target with the inbound request, then dial the WebSocket
    /// at the URL the probe finally reached.
    async fn connect(
        &self,
        target: &Target,
        inbound: Request<Body>,
    ) -> Result<TargetSocket, ForwardError> {
        let (parts, body) = inbound.into_parts();
        let url = outbound_url(target, &parts)?;

        let attempt = self.hook.begin_attempt(&Span::current(), &url);
        let probe = mirror_request(&self.client, &parts, body, url)
            .send()
            .instrument(attempt.clone())
            .await;
        let handshake_url = match probe {
            Ok(response) => {
                self.hook.end_attempt(attempt, Some(response.status()));
                response.url().clone()
            }
            Err(e) => {
                self.hook.end_attempt(attempt, None);
                return Err(e.into());
            }
        };

        let ws_url = websocket_url(handshake_url)?;
        tracing::debug!(url = %ws_url, "Dialing target WebSocket");
        let (socket, _response) = tokio_tungstenite::connect_async_tls_with_config(
            ws_url.as_str(),
            None,
            false,
            Some(Connector::NativeTls(self.tls.clone())),
        )
        .await?;
        Ok(socket)
    }
}

/// Map an http(s) URL to its ws(s) counterpart.
pub fn websocket_url(mut url: Url) -> Result<Url, ForwardError> {
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        "ws" | "wss" => return Ok(url),
        _ => return Err(ForwardError::WebSocketScheme(url.to_string())),
    };
    if url.set_scheme(scheme).is_err() {
        return Err(ForwardError::WebSocketScheme(url.to_string()));
    }
    Ok(url)
}

/// Copy frames between the two sockets until either side closes or fails.
///
/// Whichever direction finishes first ends the session; both sockets are
/// then closed.
pub async fn relay(client: WebSocket, upstream: TargetSocket) -> Result<(), RelayError> {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut target_tx, mut target_rx) = upstream.split();

    let client_to_target = async {
        while let Some(message) = client_rx.next().await {
            let message = message.map_err(RelayError::Client)?;
            if let Some(frame) = to_target(message) {
                let closing = frame.is_close();
                target_tx.send(frame).await.map_err(RelayError::Target)?;
                if closing {
                    break;
                }
            }
        }
        Ok::<(), RelayError>(())
    };

    let target_to_client = async {
        while let Some(message) = target_rx.next().await {
            let message = message.map_err(RelayError::Target)?;
            if let Some(frame) = to_client(message) {
                let closing = matches!(frame, Message::Close(_));
                client_tx.send(frame).await.map_err(RelayError::Client)?;
                if closing {
                    break;
                }
            }
        }
        Ok::<(), RelayError>(())
    };

    let result = tokio::select! {
        r = client_to_target => r,
        r = target_to_client => r,
    };

    // Either peer may already be gone.
    let _ = client_tx.close().await;
    let _ = target_tx.close().await;
    result
}

fn to_target(message: Message) -> Option<tungstenite::Message> {
    match message {
        Message::Text(text) => Some(tungstenite::Message::text(text.as_str().to_owned())),
        Message::Binary(data) => Some(tungstenite::Message::binary(data)),
        Message::Close(frame) => Some(tungstenite::Message::Close(frame.map(|f| {
            tungstenite::protocol::CloseFrame {
                code: CloseCode::from(f.code),
                reason: f.reason.as_str().to_owned().into(),
            }
        }))),
        Message::Ping(_) | Message::Pong(_) => None,
    }
}

fn to_client(message: tungstenite::Message) -> Option<Message> {
    match message {
        tungstenite::Message::Text(text) => Some(Message::Text(text.as_str().to_owned().into())),
        tungstenite::Message::Binary(data) => Some(Message::Binary(data)),
        tungstenite::Message::Close(frame) => Some(Message::Close(frame.map(|f| CloseFrame {
            code: f.code.into(),
            reason: f.reason.as_str().to_owned().into(),
        }))),
        tungstenite::Message::Ping(_)
        | tungstenite::Message::Pong(_)
        | tungstenite::Message::Frame(_) => None,
    }
}
