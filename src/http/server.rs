//! HTTP server setup and connection serving.
//!
//! # Responsibilities
//! - Build the ordinary Axum router (endpoints, static assets, 404)
//! - Wire up middleware (tracing, timeout, request ID, isolation headers)
//! - Serve each accepted connection with hyper, upgrades enabled
//! - Put the UpgradeRouter in front of every request
//! - Drain open connections on shutdown

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::endpoints::{self, EndpointState, CONFIG_SCRIPT_PATH, HEALTH_PATH};
use crate::http::{request, response};
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::listener::Listener;
use crate::routing::UpgradeRouter;
use crate::wisp::{DrainSession, UpgradeHandler, WebSocketAcceptor, WispOptions};

/// HTTP server for the gateway.
pub struct HttpServer {
    router: UpgradeRouter,
    config: Arc<GatewayConfig>,
    tracker: ConnectionTracker,
}

impl HttpServer {
    /// Create a server whose wisp path accepts WebSockets with the default session.
    pub fn new(config: GatewayConfig) -> Self {
        let options = Arc::new(WispOptions::from(&config.wisp));
        let handler = Arc::new(WebSocketAcceptor::new(options, Arc::new(DrainSession)));
        Self::with_handler(config, handler)
    }

    /// Create a server delegating wisp upgrades to `handler`.
    pub fn with_handler(config: GatewayConfig, handler: Arc<dyn UpgradeHandler>) -> Self {
        let config = Arc::new(config);
        let state = EndpointState {
            options: Arc::new(WispOptions::from(&config.wisp)),
            config: Arc::clone(&config),
        };

        let ordinary = Self::build_router(&config, state);
        let router = UpgradeRouter::new(&config.wisp.path, handler, ordinary);

        Self {
            router,
            config,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: EndpointState) -> Router {
        let public_dir = Path::new(&config.assets.public_dir);
        let not_found_page: Arc<PathBuf> = Arc::new(public_dir.join("404.html"));
        let assets = ServeDir::new(public_dir)
            .not_found_service(endpoints::not_found.with_state(not_found_page));

        Router::new()
            .route(CONFIG_SCRIPT_PATH, get(endpoints::config_script))
            .route(HEALTH_PATH, get(endpoints::healthz))
            .with_state(state)
            .fallback_service(assets)
            .layer(response::opener_policy_layer())
            .layer(response::embedder_policy_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(request::propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(request::set_request_id_layer())
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            wisp_path = %self.router.wisp_path(),
            "HTTP server starting"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok(accepted) => {
                            let guard = self.tracker.track(accepted.peer);
                            let router = self.router.clone();
                            tokio::spawn(async move {
                                serve_connection(accepted.stream, &guard, router).await;
                                drop(accepted.slot);
                                drop(guard);
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
            }
        }

        let drain = Duration::from_secs(self.config.timeouts.shutdown_secs);
        if tokio::time::timeout(drain, self.tracker.drained()).await.is_err() {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Connections still open after drain timeout"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn serve_connection(stream: TcpStream, guard: &ConnectionGuard, router: UpgradeRouter) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |request: Request<Incoming>| {
        let router = router.clone();
        async move { router.route(request).await }
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(io, service)
        .with_upgrades()
        .await
    {
        tracing::debug!(
            connection_id = %guard.id(),
            peer = %guard.peer(),
            error = %e,
            "Connection ended with error"
        );
    }
}
