//! `/config.js` and `/healthz`, plus the 404 page.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use crate::config::GatewayConfig;
use crate::health::HealthStatus;
use crate::http::response::no_store;
use crate::observability::metrics;
use crate::wisp::WispOptions;

pub const CONFIG_SCRIPT_PATH: &str = "/config.js";
pub const HEALTH_PATH: &str = "/healthz";

/// Shared, immutable state for the endpoints.
#[derive(Clone)]
pub struct EndpointState {
    pub config: Arc<GatewayConfig>,
    pub options: Arc<WispOptions>,
}

/// Runtime config as a script assigning the client's global config object.
pub async fn config_script(State(state): State<EndpointState>) -> Response {
    metrics::record_endpoint("config");
    match state.config.runtime_config().to_script() {
        Ok(script) => (no_store("application/javascript"), script).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render runtime config");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn healthz(State(state): State<EndpointState>) -> Response {
    metrics::record_endpoint("healthz");
    let status = HealthStatus::current(&state.config, &state.options);
    (no_store("application/json"), Json(status)).into_response()
}

/// Fallback for paths no static asset matched.
pub async fn not_found(State(page): State<Arc<PathBuf>>) -> Response {
    match tokio::fs::read_to_string(page.as_path()).await {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}
