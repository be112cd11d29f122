//! Upgrade discrimination on a live gateway.

use std::time::Duration;

use wisp_gateway::config::GatewayConfig;

mod common;

#[tokio::test]
async fn foreign_upgrade_path_is_closed_silently() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    for path in ["/", "/other/", "/wisp/extra", "/healthz"] {
        let request = common::upgrade_request(path, gateway.addr);
        let received = common::raw_exchange(gateway.addr, &request, Duration::from_secs(2)).await;
        assert!(received.is_empty(), "{path} got {} bytes", received.len());
    }

    gateway.stop().await;
}

#[tokio::test]
async fn wisp_path_upgrade_switches_protocols() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    for path in ["/wisp/", "/wisp", "/wisp/?session=1"] {
        let request = common::upgrade_request(path, gateway.addr);
        let received = common::raw_exchange(gateway.addr, &request, Duration::from_secs(2)).await;
        let head = String::from_utf8_lossy(&received);
        assert!(head.starts_with("HTTP/1.1 101"), "{path}: {head}");
        assert!(head.contains("s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));
    }

    gateway.stop().await;
}

#[tokio::test]
async fn websocket_client_completes_handshake() {
    let mut config = GatewayConfig::default();
    config.wisp.path = "/custom/".into();
    let gateway = common::start_gateway(config).await;

    let url = format!("ws://{}/custom/", gateway.addr);
    let (mut socket, response) = tokio_tungstenite::connect_async(url).await.unwrap();
    assert_eq!(response.status(), 101);
    socket.close(None).await.unwrap();

    let wrong = format!("ws://{}/wisp/", gateway.addr);
    assert!(tokio_tungstenite::connect_async(wrong).await.is_err());

    gateway.stop().await;
}

#[tokio::test]
async fn ordinary_requests_on_wisp_path_are_not_upgrades() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    let response = reqwest::get(gateway.url("/wisp/")).await.unwrap();
    assert_eq!(response.status(), 404);

    gateway.stop().await;
}
