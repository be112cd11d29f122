//! Wisp gateway: proxy negotiation and diagnostics.
//!
//! The server half publishes runtime defaults and health data and guards
//! the wisp upgrade path; the client half merges settings, probes
//! connectivity and launches proxied sessions.

pub mod client;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod wisp;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::UpgradeRouter;
