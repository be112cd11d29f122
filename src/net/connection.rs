//! Live connection bookkeeping.
//!
//! # Responsibilities
//! - Give every accepted connection an id for log correlation
//! - Publish the live connection count so shutdown can wait for zero

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Shared count of open connections.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    live: Arc<watch::Sender<usize>>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        let (live, _) = watch::channel(0);
        Self {
            live: Arc::new(live),
        }
    }
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection from `peer`; it counts until the guard drops.
    pub fn track(&self, peer: SocketAddr) -> ConnectionGuard {
        self.live.send_modify(|n| *n += 1);
        let guard = ConnectionGuard {
            live: Arc::clone(&self.live),
            id: ConnectionId::next(),
            peer,
        };
        tracing::trace!(connection_id = %guard.id, peer = %peer, "Connection opened");
        guard
    }

    pub fn active_count(&self) -> usize {
        *self.live.borrow()
    }

    /// Resolve once no connection is open. Callers bound this with a timeout.
    pub async fn drained(&self) {
        let mut live = self.live.subscribe();
        let _ = live.wait_for(|n| *n == 0).await;
    }
}

/// Held by the task serving one connection.
#[derive(Debug)]
pub struct ConnectionGuard {
    live: Arc<watch::Sender<usize>>,
    id: ConnectionId,
    peer: SocketAddr,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.live.send_modify(|n| *n = n.saturating_sub(1));
        tracing::trace!(connection_id = %self.id, peer = %self.peer, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn guards_count_and_get_distinct_ids() {
        let tracker = ConnectionTracker::new();
        let first = tracker.track(peer());
        let second = tracker.track(peer());

        assert_eq!(tracker.active_count(), 2);
        assert!(second.id().as_u64() > first.id().as_u64());
        assert_eq!(first.id().to_string(), format!("conn-{}", first.id().as_u64()));

        drop(first);
        assert_eq!(tracker.active_count(), 1);
        drop(second);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn drained_waits_for_last_guard() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track(peer());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        tokio::time::timeout(Duration::from_secs(2), tracker.drained())
            .await
            .expect("tracker should drain");
        assert_eq!(tracker.active_count(), 0);
    }
}
