//! `/config.js`, `/healthz` and ordinary-request headers.

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde_json::Value;
use wisp_gateway::config::{GatewayConfig, RuntimeConfig};

mod common;

#[tokio::test]
async fn config_script_assigns_runtime_defaults() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    let response = reqwest::get(gateway.url("/config.js")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/javascript");
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");

    let script = response.text().await.unwrap();
    assert!(script.starts_with("window._CONFIG = "));
    let runtime = RuntimeConfig::from_script(&script).unwrap();
    assert_eq!(runtime.wisp_path.as_deref(), Some("/wisp/"));
    assert_eq!(runtime.default_transport.as_deref(), Some("/epoxy/index.mjs"));
    assert_eq!(runtime.transports.len(), 2);

    gateway.stop().await;
}

#[tokio::test]
async fn healthz_reports_live_wisp_options() {
    let mut config = GatewayConfig::default();
    config.wisp.path = "/tunnel/".into();
    config.wisp.allow_udp_streams = true;
    config.wisp.hostname_blacklist = vec!["ads.example.net".into()];
    let gateway = common::start_gateway(config).await;

    let response = reqwest::get(gateway.url("/healthz")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()[CACHE_CONTROL], "no-store");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["wispPath"], "/tunnel/");
    assert_eq!(body["allowUdpStreams"], true);
    assert_eq!(body["dnsServers"], serde_json::json!(["1.1.1.3", "1.0.0.3"]));
    assert_eq!(body["hostnameBlacklist"], serde_json::json!(["/ads\\.example\\.net/"]));

    gateway.stop().await;
}

#[tokio::test]
async fn ordinary_responses_are_isolated_and_tagged() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    let response = reqwest::get(gateway.url("/healthz")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
    assert_eq!(headers["cross-origin-embedder-policy"], "require-corp");
    assert!(headers.contains_key("x-request-id"));

    let missing = reqwest::get(gateway.url("/nope.html")).await.unwrap();
    assert_eq!(missing.status(), 404);
    assert_eq!(missing.headers()["cross-origin-opener-policy"], "same-origin");

    gateway.stop().await;
}

#[tokio::test]
async fn client_supplied_request_id_is_echoed() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;

    let response = reqwest::Client::new()
        .get(gateway.url("/config.js"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me");

    gateway.stop().await;
}
