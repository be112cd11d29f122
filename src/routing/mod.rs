//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request head
//!     → matcher.rs (is it an upgrade? does the path match?)
//!     → router.rs decides:
//!         ordinary  → axum router (config.js, healthz, static assets)
//!         upgrade   → wisp protocol handler
//!         foreign   → connection closed, nothing written
//! ```
//!
//! # Design Decisions
//! - Paths are compared after `normalize_path`, the same rule the client uses
//! - Only upgrade requests are ever classified against the wisp path

pub mod matcher;
pub mod path;
pub mod router;

pub use path::normalize_path;
pub use router::{Dispatch, UpgradePathMismatch, UpgradeRouter};
