//! Debounced connectivity rechecks.
//!
//! Each settings update replaces the pending probe: the previous token is
//! cancelled and a new one armed under the same lock, so only the most
//! recent settings are ever probed. A probe that already started is not
//! affected here.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::settings::Settings;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// A recheck requested once the debounce window closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub settings: Settings,
}

#[derive(Debug)]
pub struct ProbeScheduler {
    window: Duration,
    requests: mpsc::UnboundedSender<ProbeRequest>,
    pending: Mutex<Option<CancellationToken>>,
}

impl ProbeScheduler {
    /// Create a scheduler and the receiver its probe requests arrive on.
    pub fn new(window: Duration) -> (Self, mpsc::UnboundedReceiver<ProbeRequest>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (
            Self {
                window,
                requests,
                pending: Mutex::new(None),
            },
            rx,
        )
    }

    /// Arm a probe for `settings`, replacing any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, settings: Settings) {
        let token = CancellationToken::new();
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = pending.replace(token.clone()) {
                previous.cancel();
            }
        }

        let window = self.window;
        let requests = self.requests.clone();
        let fired = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!("Pending probe superseded");
                }
                _ = tokio::time::sleep(window) => {
                    fired.cancel();
                    let _ = requests.send(ProbeRequest { settings });
                }
            }
        });
    }

    /// Drop the pending probe, if any. Returns whether one was pending.
    pub fn cancel_pending(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.take() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(path: &str) -> Settings {
        Settings {
            wisp_path: path.to_string(),
            search_template: "https://example.org/?q=%s".into(),
            transport: "/epoxy/index.mjs".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_updates_collapse_into_last() {
        let (scheduler, mut rx) = ProbeScheduler::new(DEFAULT_DEBOUNCE);

        scheduler.schedule(settings("/a/"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.schedule(settings("/b/"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.schedule(settings("/c/"));

        tokio::time::sleep(Duration::from_secs(2)).await;

        let request = rx.try_recv().expect("one probe requested");
        assert_eq!(request.settings.wisp_path, "/c/");
        assert!(rx.try_recv().is_err(), "only one probe requested");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_pending_suppresses_request() {
        let (scheduler, mut rx) = ProbeScheduler::new(DEFAULT_DEBOUNCE);

        scheduler.schedule(settings("/a/"));
        assert!(scheduler.cancel_pending());
        assert!(!scheduler.cancel_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_updates_each_probe() {
        let (scheduler, mut rx) = ProbeScheduler::new(DEFAULT_DEBOUNCE);

        scheduler.schedule(settings("/a/"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.schedule(settings("/b/"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(rx.try_recv().unwrap().settings.wisp_path, "/a/");
        assert_eq!(rx.try_recv().unwrap().settings.wisp_path, "/b/");
        assert!(!scheduler.cancel_pending(), "nothing left pending once fired");
    }
}
