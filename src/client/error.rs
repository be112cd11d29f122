//! Client-side errors.

use thiserror::Error;

/// Errors raised by the client subsystem.
///
/// Probe failures are reported through `ConnectivityResult` and never
/// escape the probe; the rest reach the error panel.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required external runtime dependency is absent.
    #[error("Required dependency missing: {0}")]
    StartupDependencyMissing(&'static str),

    /// The background worker could not be registered.
    #[error("Failed to register service worker: {0}")]
    WorkerRegistrationFailed(String),

    /// Health endpoint returned non-2xx or was unreachable.
    #[error("{0}")]
    HealthCheckFailed(String),

    #[error("WebSocket timed out")]
    HandshakeTimeout,

    #[error("WebSocket closed abnormally ({code})")]
    HandshakeAbnormalClose { code: u16 },

    #[error("{0}")]
    HandshakeError(String),

    /// Persisted settings were not a JSON object. Recovered as empty overrides.
    #[error("Stored settings are not valid JSON: {0}")]
    SettingsParseFailure(String),

    /// Settings changed in memory but could not be persisted.
    #[error("Settings could not be saved: {0}")]
    StorageWriteFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rewriting engine error: {0}")]
    Engine(String),

    #[error("Invalid page origin {origin}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("Unknown setting {0:?}")]
    UnknownSetting(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ClientError::HandshakeTimeout.to_string(), "WebSocket timed out");
        assert_eq!(
            ClientError::HandshakeAbnormalClose { code: 1006 }.to_string(),
            "WebSocket closed abnormally (1006)"
        );
        assert!(ClientError::StartupDependencyMissing("transport library")
            .to_string()
            .contains("transport library"));
    }
}
