//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper http1, upgrades enabled)
//!     → routing::UpgradeRouter (upgrade discriminator)
//!         ordinary → request.rs (request ID) → endpoints.rs / static assets
//!                  → response.rs (isolation headers)
//!         upgrade  → wisp handler
//! ```

pub mod endpoints;
pub mod request;
pub mod response;
pub mod server;

pub use endpoints::{CONFIG_SCRIPT_PATH, HEALTH_PATH};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
