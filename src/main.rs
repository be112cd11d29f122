//! Wisp gateway server.
//!
//! Serves the client's runtime config and health data, hands WebSocket
//! upgrades on the wisp path to the Wisp protocol handler, and closes every
//! other upgrade attempt without a response.
//!
//! ```text
//! request → net::Listener → hyper http1 → UpgradeRouter
//!     ordinary         → /config.js, /healthz, static assets
//!     upgrade on wisp  → WebSocketAcceptor → WispSession
//!     other upgrade    → connection closed, nothing written
//! ```

use wisp_gateway::config::{self, WispLogLevel};
use wisp_gateway::lifecycle::{signals, startup, Shutdown};
use wisp_gateway::observability::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let wisp_level = WispLogLevel::parse(&std::env::var("WISP_LOG_LEVEL").unwrap_or_default());
    logging::init_logging(&logging::default_directives(wisp_level));

    let config = config::load_from_env()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.listener.port,
        wisp_path = %config.wisp.path,
        default_transport = %config.client.default_transport,
        allow_udp_streams = config.wisp.allow_udp_streams,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
