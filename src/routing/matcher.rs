//! Request matching for upgrade routing.
//!
//! # Responsibilities
//! - Detect protocol-upgrade requests (`Connection: upgrade` + `Upgrade`)
//! - Match the normalized request path against the wisp path
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Header tokens are matched case-insensitively (RFC 9110)
//! - Path matching is exact after normalization, case-sensitive
//! - The query string never takes part in path matching

use axum::http::{header, HeaderMap, Uri};

use crate::routing::normalize_path;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request head matches this condition.
    fn matches(&self, uri: &Uri, headers: &HeaderMap) -> bool;
}

/// Matches requests asking for a protocol upgrade.
#[derive(Debug, Clone, Default)]
pub struct UpgradeMatcher;

impl Matcher for UpgradeMatcher {
    fn matches(&self, _uri: &Uri, headers: &HeaderMap) -> bool {
        let connection_upgrade = headers
            .get_all(header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

        connection_upgrade && headers.contains_key(header::UPGRADE)
    }
}

/// Matches requests whose normalized path equals the wisp path.
#[derive(Debug, Clone)]
pub struct WispPathMatcher {
    wisp_path: String,
}

impl WispPathMatcher {
    /// Create a new matcher. The expected path is normalized up front.
    pub fn new(wisp_path: &str) -> Self {
        Self {
            wisp_path: normalize_path(wisp_path),
        }
    }

    pub fn wisp_path(&self) -> &str {
        &self.wisp_path
    }
}

impl Matcher for WispPathMatcher {
    fn matches(&self, uri: &Uri, _headers: &HeaderMap) -> bool {
        normalize_path(uri.path()) == self.wisp_path
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, uri: &Uri, headers: &HeaderMap) -> bool {
        self.matchers.iter().all(|m| m.matches(uri, headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn upgrade_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers
    }

    #[test]
    fn test_upgrade_matcher() {
        let uri: Uri = "/wisp/".parse().unwrap();
        assert!(UpgradeMatcher.matches(&uri, &upgrade_headers()));

        let mut no_upgrade = upgrade_headers();
        no_upgrade.remove(header::UPGRADE);
        assert!(!UpgradeMatcher.matches(&uri, &no_upgrade));

        let mut keep_alive = upgrade_headers();
        keep_alive.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        assert!(!UpgradeMatcher.matches(&uri, &keep_alive));
    }

    #[test]
    fn test_wisp_path_matcher() {
        let matcher = WispPathMatcher::new("wisp");
        let headers = HeaderMap::new();

        assert!(matcher.matches(&"/wisp/".parse().unwrap(), &headers));
        assert!(matcher.matches(&"/wisp".parse().unwrap(), &headers));
        assert!(matcher.matches(&"/wisp?token=1".parse().unwrap(), &headers));
        assert!(matcher.matches(&"http://host/wisp/".parse().unwrap(), &headers));
        assert!(!matcher.matches(&"/wisp/extra/".parse().unwrap(), &headers));
        assert!(!matcher.matches(&"/WISP/".parse().unwrap(), &headers));
        assert!(!matcher.matches(&"/".parse().unwrap(), &headers));
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(UpgradeMatcher),
            Box::new(WispPathMatcher::new("/wisp/")),
        ]);

        assert!(matcher.matches(&"/wisp/".parse().unwrap(), &upgrade_headers()));
        assert!(!matcher.matches(&"/other/".parse().unwrap(), &upgrade_headers()));
        assert!(!matcher.matches(&"/wisp/".parse().unwrap(), &HeaderMap::new()));
    }
}
