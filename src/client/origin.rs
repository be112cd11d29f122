//! The page origin the client was served from.

use url::Url;

use crate::client::error::ClientError;
use crate::routing::normalize_path;

/// Scheme security and host of the serving page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrigin {
    secure: bool,
    host: String,
}

impl PageOrigin {
    pub fn new(secure: bool, host: impl Into<String>) -> Self {
        Self {
            secure,
            host: host.into(),
        }
    }

    /// Parse an `http(s)://host[:port]` origin. Any path is ignored.
    pub fn parse(origin: &str) -> Result<Self, ClientError> {
        let invalid = |reason: &str| ClientError::InvalidOrigin {
            origin: origin.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(origin).map_err(|e| invalid(&e.to_string()))?;
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            _ => return Err(invalid("scheme must be http or https")),
        };
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self::new(secure, host))
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// WebSocket URL for a wisp path: `wss` on secure origins, `ws` otherwise.
    pub fn wisp_url(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{}", self.host, normalize_path(path))
    }

    /// Same-origin HTTP URL for an absolute path.
    pub fn http_url(&self, path: &str) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}{}", self.host, path)
    }
}
