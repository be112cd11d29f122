//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binaries
//! - Derive the default filter from the Wisp log level
//!
//! # Design Decisions
//! - `RUST_LOG` wins when set; otherwise the gateway logs at info and the
//!   Wisp layer at `WISP_LOG_LEVEL` (silent by default)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::WispLogLevel;

/// Default filter directives for the gateway binary.
pub fn default_directives(wisp_level: WispLogLevel) -> String {
    format!(
        "wisp_gateway=info,tower_http=info,wisp_gateway::wisp={}",
        wisp_level.as_filter()
    )
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wisp_layer_is_silent_by_default() {
        let directives = default_directives(WispLogLevel::default());
        assert!(directives.ends_with("wisp_gateway::wisp=off"));
        assert!(directives.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn wisp_level_is_applied() {
        assert!(default_directives(WispLogLevel::Debug).contains("wisp_gateway::wisp=debug"));
    }
}
