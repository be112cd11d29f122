//! WebSocket handshake acceptance on the wisp path.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::protocol::Role;
use tokio_tungstenite::WebSocketStream;

use crate::wisp::{UpgradeHandler, WispOptions};

/// A server-side WebSocket on an upgraded connection.
pub type WispSocket = WebSocketStream<TokioIo<Upgraded>>;

/// Runs the Wisp protocol over an accepted socket.
pub trait WispSession: Send + Sync + 'static {
    fn run(&self, socket: WispSocket, options: Arc<WispOptions>) -> BoxFuture<'static, ()>;
}

/// Session that only services control frames until the peer goes away.
///
/// Stands in when no multiplexing implementation is plugged in, so probes
/// and handshakes still complete.
#[derive(Debug, Default)]
pub struct DrainSession;

impl WispSession for DrainSession {
    fn run(&self, mut socket: WispSocket, _options: Arc<WispOptions>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(message) if message.is_close() => {
                        tracing::debug!("Peer closed wisp socket");
                    }
                    Ok(message) => {
                        tracing::trace!(len = message.len(), "Discarding wisp frame");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Wisp socket error");
                        break;
                    }
                }
            }
        })
    }
}

/// Default [`UpgradeHandler`]: completes the RFC 6455 handshake and hands the
/// socket to a [`WispSession`].
pub struct WebSocketAcceptor {
    options: Arc<WispOptions>,
    session: Arc<dyn WispSession>,
}

impl WebSocketAcceptor {
    pub fn new(options: Arc<WispOptions>, session: Arc<dyn WispSession>) -> Self {
        Self { options, session }
    }
}

impl UpgradeHandler for WebSocketAcceptor {
    fn route_request(&self, mut request: Request<Body>) -> Response<Body> {
        let is_websocket = request
            .headers()
            .get(header::UPGRADE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false);
        let version_ok = request
            .headers()
            .get(header::SEC_WEBSOCKET_VERSION)
            .map(|v| v.as_bytes() == b"13")
            .unwrap_or(false);

        let key = match request.headers().get(header::SEC_WEBSOCKET_KEY) {
            Some(key) if is_websocket && version_ok => key.as_bytes().to_vec(),
            _ => {
                tracing::debug!("Malformed websocket handshake on wisp path");
                return status_response(StatusCode::BAD_REQUEST);
            }
        };

        let accept = match HeaderValue::from_str(&derive_accept_key(&key)) {
            Ok(value) => value,
            Err(_) => return status_response(StatusCode::BAD_REQUEST),
        };

        let on_upgrade = hyper::upgrade::on(&mut request);
        let session = Arc::clone(&self.session);
        let options = Arc::clone(&self.options);
        tokio::spawn(async move {
            match on_upgrade.await {
                Ok(upgraded) => {
                    let socket =
                        WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None)
                            .await;
                    tracing::debug!("Wisp socket established");
                    session.run(socket, options).await;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Upgrade did not complete");
                }
            }
        });

        let mut response = status_response(StatusCode::SWITCHING_PROTOCOLS);
        let headers = response.headers_mut();
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("Upgrade"));
        headers.insert(header::SEC_WEBSOCKET_ACCEPT, accept);
        response
    }
}

fn status_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
