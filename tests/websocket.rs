//! WebSocket relay through a running proxy.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rotary_proxy::config::UpstreamTls;
use rotary_proxy::ProxyConfig;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

mod common;

fn ws_targets(addrs: &[std::net::SocketAddr]) -> Vec<String> {
    common::http_targets(addrs)
}

#[tokio::test]
async fn frames_are_relayed_both_ways() {
    let backend = common::start_ws_echo_backend().await;
    let proxy = common::start_proxy(ws_targets(&[backend])).await;

    let (mut ws, response) = connect_async(proxy.ws_url("/chat")).await.unwrap();
    assert_eq!(response.status(), 101);

    ws.send(Message::text("hello")).await.unwrap();
    match timeout(Duration::from_secs(5), ws.next()).await.unwrap() {
        Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), "hello"),
        other => panic!("unexpected frame {:?}", other),
    }

    ws.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    match timeout(Duration::from_secs(5), ws.next()).await.unwrap() {
        Some(Ok(Message::Binary(data))) => assert_eq!(&data[..], &[1, 2, 3]),
        other => panic!("unexpected frame {:?}", other),
    }

    ws.close(None).await.unwrap();
    assert!(
        common::eventually(Duration::from_secs(5), || proxy.sessions.active_count() == 0).await
    );
}

#[tokio::test]
async fn target_failure_ends_only_its_session() {
    let backend = common::start_ws_echo_backend().await;
    let proxy = common::start_proxy(ws_targets(&[backend])).await;

    let (mut doomed, _) = connect_async(proxy.ws_url("/a")).await.unwrap();
    let (mut survivor, _) = connect_async(proxy.ws_url("/b")).await.unwrap();
    assert!(common::eventually(Duration::from_secs(5), || proxy.sessions.active_count() == 2).await);

    doomed.send(Message::text("die")).await.unwrap();
    let ended = timeout(Duration::from_secs(5), async {
        loop {
            match doomed.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "relay session was not torn down");

    survivor.send(Message::text("still here")).await.unwrap();
    match timeout(Duration::from_secs(5), survivor.next()).await.unwrap() {
        Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), "still here"),
        other => panic!("unexpected frame {:?}", other),
    }
    assert!(common::eventually(Duration::from_secs(5), || proxy.sessions.active_count() == 1).await);
}

#[tokio::test]
async fn unreachable_target_closes_upgraded_client() {
    let dead = common::unused_addr().await;
    let proxy = common::start_proxy(ws_targets(&[dead])).await;

    let (mut ws, _) = connect_async(proxy.ws_url("/chat")).await.unwrap();
    let next = timeout(Duration::from_secs(10), ws.next()).await.unwrap();
    assert!(!matches!(next, Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_)))));
    assert_eq!(proxy.sessions.active_count(), 0);
}

#[tokio::test]
async fn websocket_and_plain_requests_share_rotation() {
    let ws_backend = common::start_ws_echo_backend().await;
    let http_backend = common::start_backend(axum::Router::new().route(
        "/{*path}",
        axum::routing::get(|| async { "plain" }),
    ))
    .await;
    let proxy = common::start_proxy(ws_targets(&[ws_backend, http_backend])).await;

    let (mut ws, _) = connect_async(proxy.ws_url("/first")).await.unwrap();
    ws.send(Message::text("ping")).await.unwrap();
    match timeout(Duration::from_secs(5), ws.next()).await.unwrap() {
        Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), "ping"),
        other => panic!("unexpected frame {:?}", other),
    }

    let body = common::client()
        .get(proxy.url("/second"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "plain");
}

#[tokio::test]
async fn insecure_upstream_relays_to_self_signed_wss_target() {
    let backend = common::start_tls_backend(common::ws_echo_router()).await;
    let proxy = common::start_proxy(common::https_targets(&[backend])).await;

    let (mut ws, _) = connect_async(proxy.ws_url("/secure")).await.unwrap();
    ws.send(Message::text("over tls")).await.unwrap();
    match timeout(Duration::from_secs(5), ws.next()).await.unwrap() {
        Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), "over tls"),
        other => panic!("unexpected frame {:?}", other),
    }
    assert_eq!(proxy.sessions.active_count(), 1);
}

#[tokio::test]
async fn verified_upstream_refuses_self_signed_wss_target() {
    let backend = common::start_tls_backend(common::ws_echo_router()).await;
    let mut config = ProxyConfig::default();
    config.upstream.tls = UpstreamTls::Verify;
    let proxy = common::start_proxy_with(config, common::https_targets(&[backend]), None).await;

    let (mut ws, _) = connect_async(proxy.ws_url("/secure")).await.unwrap();
    let _ = ws.send(Message::text("over tls")).await;
    let next = timeout(Duration::from_secs(10), ws.next()).await.unwrap();
    assert!(!matches!(next, Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_)))));
    assert_eq!(proxy.sessions.active_count(), 0);
}
