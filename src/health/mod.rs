//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /healthz
//!     → status.rs builds HealthStatus from config + live wisp options
//!     → JSON, Cache-Control: no-store
//!
//! ConnectivityProbe (client)
//!     → parses HealthStatus
//!     → uses the reported wisp path for the handshake
//! ```
//!
//! # Design Decisions
//! - Recomputed on every request, never cached
//! - Only the documented fields are exposed, never internal errors

pub mod status;

pub use status::HealthStatus;
