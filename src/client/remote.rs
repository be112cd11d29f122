//! Same-origin fetches of `/config.js` and `/healthz`.

use std::time::{Duration, Instant};

use reqwest::header::{CACHE_CONTROL, PRAGMA};

use crate::client::error::ClientError;
use crate::client::origin::PageOrigin;
use crate::config::RuntimeConfig;
use crate::health::HealthStatus;
use crate::http::{CONFIG_SCRIPT_PATH, HEALTH_PATH};

/// Health payload plus the time the request took.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub latency: Duration,
}

/// HTTP access to the serving gateway.
#[derive(Debug, Clone)]
pub struct RemoteServer {
    client: reqwest::Client,
    origin: PageOrigin,
}

impl RemoteServer {
    pub fn new(client: reqwest::Client, origin: PageOrigin) -> Self {
        Self { client, origin }
    }

    pub fn origin(&self) -> &PageOrigin {
        &self.origin
    }

    /// Runtime config from `/config.js`. Any failure yields the empty layer.
    pub async fn fetch_runtime_config(&self) -> RuntimeConfig {
        let url = self.origin.http_url(CONFIG_SCRIPT_PATH);
        let script = match self.get_text(&url).await {
            Ok(script) => script,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Runtime config unavailable");
                return RuntimeConfig::default();
            }
        };

        RuntimeConfig::from_script(&script).unwrap_or_else(|| {
            tracing::warn!(url = %url, "Runtime config script not understood");
            RuntimeConfig::default()
        })
    }

    /// Non-cached `GET /healthz`.
    pub async fn fetch_health(&self) -> Result<HealthReport, ClientError> {
        let url = self.origin.http_url(HEALTH_PATH);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| ClientError::HealthCheckFailed(format!("Health check failed: {e}")))?;

        let code = response.status();
        if !code.is_success() {
            return Err(ClientError::HealthCheckFailed(format!(
                "Health check failed with {}",
                code.as_u16()
            )));
        }

        let status = response
            .json::<HealthStatus>()
            .await
            .map_err(|e| ClientError::HealthCheckFailed(format!("Health check failed: {e}")))?;

        Ok(HealthReport {
            status,
            latency: start.elapsed(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}
