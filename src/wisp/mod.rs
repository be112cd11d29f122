//! Boundary to the Wisp protocol handler.
//!
//! # Data Flow
//! ```text
//! UpgradeRouter (path matched)
//!     → UpgradeHandler::route_request (handshake response)
//!     → hyper upgrade completes
//!     → WispSession::run (stream multiplexing, external)
//! ```
//!
//! # Design Decisions
//! - The multiplexing protocol lives behind `WispSession`; the gateway only
//!   accepts the WebSocket handshake and hands the stream over
//! - Options are built once from config and shared read-only

pub mod acceptor;
pub mod options;

use axum::body::Body;
use axum::http::{Request, Response};

pub use acceptor::{DrainSession, WebSocketAcceptor, WispSession, WispSocket};
pub use options::{HostnamePattern, WispOptions};

/// Receives every upgrade request that targeted the wisp path.
///
/// The returned response is written as the handshake reply; the
/// implementation is expected to take over the connection through
/// `hyper::upgrade::on`.
pub trait UpgradeHandler: Send + Sync + 'static {
    fn route_request(&self, request: Request<Body>) -> Response<Body>;
}
