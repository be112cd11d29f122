//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use wisp_gateway::client::{PageOrigin, RemoteServer};
use wisp_gateway::config::GatewayConfig;
use wisp_gateway::net::Listener;
use wisp_gateway::{HttpServer, Shutdown};

/// A gateway serving on an ephemeral loopback port.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn origin(&self) -> PageOrigin {
        PageOrigin::new(false, self.addr.to_string())
    }

    pub fn remote(&self) -> RemoteServer {
        RemoteServer::new(reqwest::Client::new(), self.origin())
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Start a gateway with `config`, ignoring its listener address.
pub async fn start_gateway(mut config: GatewayConfig) -> TestGateway {
    config.assets.public_dir = std::env::temp_dir()
        .join("wisp-gateway-tests-no-assets")
        .display()
        .to_string();
    config.timeouts.shutdown_secs = 1;

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_tcp(tcp, 64);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestGateway {
        addr,
        shutdown,
        handle,
    }
}

/// A WebSocket upgrade request for `path`, as raw bytes.
pub fn upgrade_request(path: &str, host: SocketAddr) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    )
}

/// Write `request` and read until the peer closes or `wait` passes.
pub async fn raw_exchange(addr: SocketAddr, request: &str, wait: Duration) -> Vec<u8> {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut received = Vec::new();
    let mut chunk = [0u8; 1024];
    let _ = tokio::time::timeout(wait, async {
        loop {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    received.extend_from_slice(&chunk[..n]);
                    if received.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
            }
        }
    })
    .await;
    received
}

/// What a mock gateway does with anything that is not `/healthz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeBehavior {
    /// Close the connection without writing anything.
    Drop,
    /// Keep the connection open and never answer.
    Hang,
}

/// Start a programmable stand-in for the gateway.
///
/// `/healthz` answers with `health_status` and `health_body`; every other
/// request gets `upgrade`.
pub async fn start_mock_gateway(
    health_status: u16,
    health_body: &'static str,
    upgrade: UpgradeBehavior,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let path = read_request_path(&mut socket).await;
                if path.as_deref() == Some("/healthz") {
                    let reason = match health_status {
                        200 => "OK",
                        503 => "Service Unavailable",
                        _ => "Error",
                    };
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        health_status,
                        reason,
                        health_body.len(),
                        health_body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                    return;
                }

                match upgrade {
                    UpgradeBehavior::Drop => drop(socket),
                    UpgradeBehavior::Hang => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        drop(socket);
                    }
                }
            });
        }
    });

    addr
}

async fn read_request_path(socket: &mut TcpStream) -> Option<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buffer);
    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(String::from)
}
