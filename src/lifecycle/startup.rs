//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when configured
//! - Bind the listener
//! - Run the HTTP server until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server failed: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bring the gateway up and serve until `shutdown` fires.
pub async fn run(config: GatewayConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => {
                tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address");
            }
        }
    }

    let listener = Listener::bind(&config.listener).await?;
    log_addresses(&listener)?;

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}

fn log_addresses(listener: &Listener) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(url = %format!("http://localhost:{}", addr.port()), "Listening");
    if addr.ip().is_unspecified() {
        tracing::info!(url = %format!("http://{}", addr), "Listening on every interface");
    }
    Ok(())
}
