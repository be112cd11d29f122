//! Client subsystem: what the served page does, runnable off the browser.
//!
//! # Data Flow
//! ```text
//! /config.js → RuntimeConfig
//!     → settings.rs (defaults < runtime < persisted) ⇄ storage.rs
//!     → update → schedule.rs (350 ms debounce) → probe.rs
//!
//! probe.rs: GET /healthz → WebSocket handshake on the reported path
//!     → ConnectivityResult → controls.rs (status, details)
//!
//! bootstrap.rs: submit → worker → search.rs → transport → content frame
//! ```
//!
//! # Design Decisions
//! - Browser collaborators (engine, transport, worker, DOM) are traits
//! - Settings changes flow through a watch channel, probes through a token

pub mod bootstrap;
pub mod controls;
pub mod error;
pub mod origin;
pub mod probe;
pub mod remote;
pub mod schedule;
pub mod search;
pub mod settings;
pub mod storage;

pub use bootstrap::{ExternalDeps, ProxyBootstrap, RoutingRequest};
pub use controls::{Command, Control, Controls};
pub use error::ClientError;
pub use origin::PageOrigin;
pub use probe::{ConnectivityProbe, ConnectivityResult, HandshakeOutcome, ProbeState};
pub use remote::RemoteServer;
pub use settings::{SettingKey, Settings, SettingsStore};
pub use storage::{FileStorage, MemoryStorage, SettingsStorage};
