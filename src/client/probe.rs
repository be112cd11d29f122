//! Connectivity probe: health fetch, then a WebSocket handshake.
//!
//! # States
//! ```text
//! idle → checking → ok     handshake opened on the configured path
//!                 → warn   handshake opened, server path differs from local
//!                 → error  health failed, timed out, closed or refused
//! ```
//!
//! # Design Decisions
//! - The handshake is raced against a hard timer; losing the race drops the
//!   socket future, so nothing fires after the verdict
//! - A new probe cancels the one in flight; a cancelled probe publishes nothing
//! - Failures are results, never errors, so callers always get a verdict

use std::io::ErrorKind;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_util::sync::CancellationToken;

use crate::client::error::ClientError;
use crate::client::remote::{HealthReport, RemoteServer};
use crate::routing::normalize_path;

pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Close code reported when the peer drops the connection before open.
pub const ABNORMAL_CLOSURE: u16 = 1006;

const CLOSE_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeState {
    Idle,
    Checking,
    Ok,
    Warn,
    Error,
}

impl ProbeState {
    /// Status text shown next to the indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Checking => "Checking",
            Self::Ok => "Ready",
            Self::Warn => "Warning",
            Self::Error => "Error",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityResult {
    pub state: ProbeState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handshake_latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wisp_url: Option<String>,
}

impl ConnectivityResult {
    pub fn idle() -> Self {
        Self::bare(ProbeState::Idle, "Not checked yet")
    }

    pub fn checking() -> Self {
        Self::bare(ProbeState::Checking, "Probing server and WebSocket upgrade...")
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::bare(ProbeState::Error, message)
    }

    fn bare(state: ProbeState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            health_latency_ms: None,
            handshake_latency_ms: None,
            wisp_url: None,
        }
    }
}

impl Default for ConnectivityResult {
    fn default() -> Self {
        Self::idle()
    }
}

/// How the handshake phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Open { latency: Duration },
    TimedOut,
    AbnormalClose { code: u16 },
    TransportError { detail: Option<String> },
}

impl HandshakeOutcome {
    pub fn from_error(error: &WsError) -> Self {
        match error {
            WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::HandshakeIncomplete) => Self::AbnormalClose {
                code: ABNORMAL_CLOSURE,
            },
            WsError::Io(e)
                if matches!(
                    e.kind(),
                    ErrorKind::UnexpectedEof
                        | ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionAborted
                        | ErrorKind::BrokenPipe
                ) =>
            {
                Self::AbnormalClose {
                    code: ABNORMAL_CLOSURE,
                }
            }
            WsError::Http(response) => Self::TransportError {
                detail: Some(format!(
                    "WebSocket handshake rejected with {}",
                    response.status().as_u16()
                )),
            },
            other => Self::TransportError {
                detail: Some(other.to_string()).filter(|d| !d.is_empty()),
            },
        }
    }

    /// Final verdict combining the handshake with the health phase.
    pub fn into_result(self, context: ProbeContext) -> ConnectivityResult {
        let health_latency_ms = Some(millis(context.health_latency));
        let wisp_url = Some(context.wisp_url.clone());

        let failure = |message: String| ConnectivityResult {
            state: ProbeState::Error,
            message,
            health_latency_ms,
            handshake_latency_ms: None,
            wisp_url: wisp_url.clone(),
        };
        let latency = match self {
            Self::Open { latency } => latency,
            Self::TimedOut => return failure(ClientError::HandshakeTimeout.to_string()),
            Self::AbnormalClose { code } => {
                return failure(ClientError::HandshakeAbnormalClose { code }.to_string())
            }
            Self::TransportError { detail } => {
                let detail = detail.unwrap_or_else(|| "WebSocket connection failed".to_string());
                return failure(ClientError::HandshakeError(detail).to_string());
            }
        };

        let handshake_ms = millis(latency);
        let mut timings = format!(
            "health {} ms | handshake {} ms",
            millis(context.health_latency),
            handshake_ms
        );
        if let Some(dns) = context.dns_servers.as_ref().filter(|d| !d.is_empty()) {
            timings.push_str(&format!(" | DNS: {}", dns.join(", ")));
        }

        let (state, message) = match &context.local_path {
            Some(local) if *local != context.server_path => (
                ProbeState::Warn,
                format!(
                    "Server uses {} instead of {}; the server path will be used | {}",
                    context.server_path, local, timings
                ),
            ),
            _ => (
                ProbeState::Ok,
                format!("Healthy at {} | {}", context.wisp_url, timings),
            ),
        };

        ConnectivityResult {
            state,
            message,
            health_latency_ms,
            handshake_latency_ms: Some(handshake_ms),
            wisp_url,
        }
    }
}

/// What the health phase learned, consumed by the verdict.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub wisp_url: String,
    pub server_path: String,
    /// Locally configured path; set only when the server reported its own.
    pub local_path: Option<String>,
    pub health_latency: Duration,
    pub dns_servers: Option<Vec<String>>,
}

impl ProbeContext {
    fn new(remote: &RemoteServer, report: &HealthReport, local_path: &str) -> Self {
        let local = normalize_path(local_path);
        let (server_path, local_path) = match report.status.wisp_path() {
            Some(reported) => (normalize_path(reported), Some(local)),
            None => (local, None),
        };

        Self {
            wisp_url: remote.origin().wisp_url(&server_path),
            server_path,
            local_path,
            health_latency: report.latency,
            dns_servers: report.status.dns_servers.clone(),
        }
    }
}

/// Open a WebSocket to `url` under a hard timer, then close it normally.
pub async fn handshake(url: &str, timeout: Duration) -> HandshakeOutcome {
    let start = Instant::now();

    let mut socket = match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url)).await
    {
        Err(_) => {
            tracing::debug!(url = %url, "Probe handshake timed out");
            return HandshakeOutcome::TimedOut;
        }
        Ok(Err(e)) => {
            tracing::debug!(url = %url, error = %e, "Probe handshake failed");
            return HandshakeOutcome::from_error(&e);
        }
        Ok(Ok((socket, _response))) => socket,
    };
    let latency = start.elapsed();

    let close = socket.close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "probe".into(),
    }));
    if let Ok(Err(e)) = tokio::time::timeout(CLOSE_GRACE, close).await {
        tracing::trace!(error = %e, "Probe socket close failed");
    }

    HandshakeOutcome::Open { latency }
}

/// Health-then-handshake probe with cancel-and-restart semantics.
pub struct ConnectivityProbe {
    remote: RemoteServer,
    timeout: Duration,
    status: watch::Sender<ConnectivityResult>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl ConnectivityProbe {
    pub fn new(remote: RemoteServer) -> Self {
        let (status, _) = watch::channel(ConnectivityResult::idle());
        Self {
            remote,
            timeout: HANDSHAKE_TIMEOUT,
            status,
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn remote(&self) -> &RemoteServer {
        &self.remote
    }

    /// Latest published result.
    pub fn current(&self) -> ConnectivityResult {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityResult> {
        self.status.subscribe()
    }

    /// Cancel any probe in flight and start a new one.
    ///
    /// Returns `None` when this probe was itself superseded.
    pub async fn probe(&self, local_path: &str) -> Option<ConnectivityResult> {
        let token = CancellationToken::new();
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = in_flight.replace(token.clone()) {
                previous.cancel();
            }
        }
        self.run(local_path, token).await
    }

    /// Run one probe until it finishes or `cancel` fires.
    pub async fn run(
        &self,
        local_path: &str,
        cancel: CancellationToken,
    ) -> Option<ConnectivityResult> {
        if cancel.is_cancelled() {
            return None;
        }
        self.status.send_replace(ConnectivityResult::checking());

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Probe superseded");
                return None;
            }
            result = self.check(local_path) => result,
        };

        if cancel.is_cancelled() {
            return None;
        }
        tracing::info!(state = result.state.as_str(), message = %result.message, "Probe finished");
        self.status.send_replace(result.clone());
        Some(result)
    }

    async fn check(&self, local_path: &str) -> ConnectivityResult {
        let report = match self.remote.fetch_health().await {
            Ok(report) => report,
            Err(e) => return ConnectivityResult::error(e.to_string()),
        };

        let context = ProbeContext::new(&self.remote, &report, local_path);
        handshake(&context.wisp_url, self.timeout)
            .await
            .into_result(context)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(local: Option<&str>) -> ProbeContext {
        ProbeContext {
            wisp_url: "wss://proxy.test/wisp/".into(),
            server_path: "/wisp/".into(),
            local_path: local.map(String::from),
            health_latency: Duration::from_millis(12),
            dns_servers: Some(vec!["1.1.1.3".into(), "1.0.0.3".into()]),
        }
    }

    #[test]
    fn open_on_matching_path_is_ok() {
        let result = HandshakeOutcome::Open {
            latency: Duration::from_millis(30),
        }
        .into_result(context(Some("/wisp/")));

        assert_eq!(result.state, ProbeState::Ok);
        assert_eq!(
            result.message,
            "Healthy at wss://proxy.test/wisp/ | health 12 ms | handshake 30 ms | DNS: 1.1.1.3, 1.0.0.3"
        );
        assert_eq!(result.health_latency_ms, Some(12));
        assert_eq!(result.handshake_latency_ms, Some(30));
    }

    #[test]
    fn open_on_other_path_warns() {
        let result = HandshakeOutcome::Open {
            latency: Duration::from_millis(5),
        }
        .into_result(context(Some("/mine/")));

        assert_eq!(result.state, ProbeState::Warn);
        assert!(result.message.contains("/mine/"));
        assert!(result.message.contains("the server path will be used"));
    }

    #[test]
    fn failures_name_the_cause() {
        let timed_out = HandshakeOutcome::TimedOut.into_result(context(None));
        assert_eq!(timed_out.state, ProbeState::Error);
        assert_eq!(timed_out.message, "WebSocket timed out");
        assert!(timed_out.handshake_latency_ms.is_none());

        let closed = HandshakeOutcome::AbnormalClose { code: 1006 }.into_result(context(None));
        assert_eq!(closed.message, "WebSocket closed abnormally (1006)");

        let unknown = HandshakeOutcome::TransportError { detail: None }.into_result(context(None));
        assert_eq!(unknown.message, "WebSocket connection failed");
    }

    #[test]
    fn peer_drop_maps_to_abnormal_close() {
        let eof = WsError::Io(std::io::Error::new(ErrorKind::UnexpectedEof, "eof"));
        assert_eq!(
            HandshakeOutcome::from_error(&eof),
            HandshakeOutcome::AbnormalClose { code: 1006 }
        );
        assert_eq!(
            HandshakeOutcome::from_error(&WsError::ConnectionClosed),
            HandshakeOutcome::AbnormalClose { code: 1006 }
        );

        let refused = WsError::Io(std::io::Error::new(ErrorKind::ConnectionRefused, "refused"));
        assert!(matches!(
            HandshakeOutcome::from_error(&refused),
            HandshakeOutcome::TransportError { detail: Some(_) }
        ));
    }

    #[test]
    fn state_labels() {
        assert_eq!(ProbeState::Ok.label(), "Ready");
        assert_eq!(ProbeState::Warn.label(), "Warning");
        assert_eq!(
            serde_json::to_value(ProbeState::Checking).unwrap(),
            serde_json::json!("checking")
        );
    }
}
