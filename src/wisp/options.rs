//! Live options of the Wisp layer, as reported by `/healthz`.

use std::fmt;

use crate::config::WispConfig;

/// A blacklisted hostname, kept literal and reported as an escaped regex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnamePattern {
    literal: String,
}

impl HostnamePattern {
    pub fn new(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
        }
    }

    /// Regex source equivalent to this pattern.
    pub fn source(&self) -> String {
        let mut escaped = String::with_capacity(self.literal.len() * 2);
        for c in self.literal.chars() {
            if matches!(
                c,
                '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
            ) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }
}

/// Renders as a regex literal, e.g. `/example\.com/`.
impl fmt::Display for HostnamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WispOptions {
    pub allow_udp_streams: bool,
    pub hostname_blacklist: Vec<HostnamePattern>,
    pub dns_servers: Vec<String>,
}

impl From<&WispConfig> for WispOptions {
    fn from(config: &WispConfig) -> Self {
        Self {
            allow_udp_streams: config.allow_udp_streams,
            hostname_blacklist: config
                .hostname_blacklist
                .iter()
                .map(|entry| HostnamePattern::new(entry.as_str()))
                .collect(),
            dns_servers: config.dns_servers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_renders_escaped_literal() {
        assert_eq!(HostnamePattern::new("example.com").to_string(), "/example\\.com/");
        assert_eq!(HostnamePattern::new("a+b(c)").to_string(), "/a\\+b\\(c\\)/");
    }

    #[test]
    fn options_follow_config() {
        let options = WispOptions::from(&WispConfig::default());
        assert_eq!(options.hostname_blacklist, vec![HostnamePattern::new("example.com")]);
        assert!(!options.allow_udp_streams);
    }
}
