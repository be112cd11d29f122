//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (defaults.rs)
//!     → optional TOML file (loader.rs, WISP_GATEWAY_CONFIG)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to the endpoints and the upgrade router
//! ```
//!
//! # Design Decisions
//! - Config is read once at boot and never mutated; a restart picks up changes
//! - All fields have defaults to allow an empty environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod defaults;
pub mod loader;
pub mod runtime;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, ConfigError};
pub use runtime::RuntimeConfig;
pub use schema::{GatewayConfig, ListenerConfig, WispConfig, WispLogLevel};
