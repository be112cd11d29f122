//! Upgrade routing: the discriminator in front of every request.
//!
//! # Responsibilities
//! - Send ordinary requests to the ordinary router untouched
//! - Hand upgrade requests on the wisp path to the protocol handler
//! - Fail closed on every other upgrade request
//!
//! # Design Decisions
//! - A rejected upgrade is returned as a service error, so hyper drops the
//!   connection without writing a response
//! - No state besides the immutable wisp path and handler

use std::sync::Arc;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{HeaderMap, Request, Response, Uri};
use axum::BoxError;
use tower::ServiceExt;

use crate::observability::metrics;
use crate::routing::matcher::{AndMatcher, Matcher, UpgradeMatcher, WispPathMatcher};
use crate::wisp::UpgradeHandler;

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Plain HTTP request for the ordinary router.
    Ordinary,
    /// Upgrade on the wisp path, delegated to the protocol handler.
    Upgrade,
    /// Upgrade anywhere else, closed without a response.
    Reject,
}

/// An upgrade request that targeted something other than the wisp path.
#[derive(Debug, thiserror::Error)]
#[error("upgrade path {path} does not match wisp path {expected}")]
pub struct UpgradePathMismatch {
    pub path: String,
    pub expected: String,
}

/// Classifies every incoming request and dispatches it.
#[derive(Clone)]
pub struct UpgradeRouter {
    upgrade: UpgradeMatcher,
    wisp_upgrade: Arc<AndMatcher>,
    wisp_path: String,
    handler: Arc<dyn UpgradeHandler>,
    ordinary: axum::Router,
}

impl UpgradeRouter {
    pub fn new(wisp_path: &str, handler: Arc<dyn UpgradeHandler>, ordinary: axum::Router) -> Self {
        let path = WispPathMatcher::new(wisp_path);
        Self {
            upgrade: UpgradeMatcher,
            wisp_path: path.wisp_path().to_string(),
            wisp_upgrade: Arc::new(AndMatcher::new(vec![
                Box::new(UpgradeMatcher),
                Box::new(path),
            ])),
            handler,
            ordinary,
        }
    }

    /// The normalized path upgrades must target.
    pub fn wisp_path(&self) -> &str {
        &self.wisp_path
    }

    pub fn classify(&self, uri: &Uri, headers: &HeaderMap) -> Dispatch {
        if self.wisp_upgrade.matches(uri, headers) {
            Dispatch::Upgrade
        } else if !self.upgrade.matches(uri, headers) {
            Dispatch::Ordinary
        } else {
            Dispatch::Reject
        }
    }

    /// Route a request.
    ///
    /// `Err` means the connection must be closed without a response.
    pub async fn route<B>(&self, request: Request<B>) -> Result<Response<Body>, UpgradePathMismatch>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        match self.classify(request.uri(), request.headers()) {
            Dispatch::Ordinary => {
                let response = self
                    .ordinary
                    .clone()
                    .oneshot(request.map(Body::new))
                    .await
                    .unwrap_or_else(|never| match never {});
                Ok(response)
            }
            Dispatch::Upgrade => {
                tracing::debug!(path = %request.uri().path(), "Delegating upgrade to wisp handler");
                metrics::record_upgrade(true);
                Ok(self.handler.route_request(request.map(Body::new)))
            }
            Dispatch::Reject => {
                let path = request.uri().path().to_string();
                tracing::debug!(path = %path, expected = %self.wisp_path(), "Closing upgrade on foreign path");
                metrics::record_upgrade(false);
                Err(UpgradePathMismatch {
                    path,
                    expected: self.wisp_path().to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    impl UpgradeHandler for CountingHandler {
        fn route_request(&self, _request: Request<Body>) -> Response<Body> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Response::builder()
                .status(StatusCode::SWITCHING_PROTOCOLS)
                .body(Body::empty())
                .unwrap()
        }
    }

    fn router(handler: Arc<CountingHandler>) -> UpgradeRouter {
        let ordinary = axum::Router::new().route("/wisp/", get(|| async { "ordinary" }));
        UpgradeRouter::new("/wisp/", handler, ordinary)
    }

    fn upgrade_request(path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header(header::CONNECTION, "Upgrade")
            .header(header::UPGRADE, "websocket")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn matching_upgrade_is_delegated() {
        let handler = Arc::new(CountingHandler::default());
        let router = router(handler.clone());

        for path in ["/wisp/", "/wisp", "/wisp?x=1"] {
            let response = router.route(upgrade_request(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn foreign_upgrade_is_rejected() {
        let handler = Arc::new(CountingHandler::default());
        let router = router(handler.clone());

        for path in ["/", "/other/", "/wisp/x", "/WISP/"] {
            let err = router.route(upgrade_request(path)).await.unwrap_err();
            assert_eq!(err.expected, "/wisp/");
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plain_request_reaches_ordinary_router() {
        let handler = Arc::new(CountingHandler::default());
        let router = router(handler.clone());

        let request = Request::builder().uri("/wisp/").body(Body::empty()).unwrap();
        let response = router.route(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }
}
