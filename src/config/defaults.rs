//! Built-in defaults shared by the server and the client.
//!
//! These are the lowest-precedence settings layer. The server falls back to
//! them when the environment is silent, and the client falls back to them
//! when the runtime config is missing a field.

/// Path reserved for Wisp upgrade requests.
pub const WISP_PATH: &str = "/wisp/";

/// Search template; `%s` is replaced with the encoded query.
pub const SEARCH_TEMPLATE: &str = "https://www.google.com/search?q=%s";

/// Transport selected when nothing else is configured.
pub const TRANSPORT: &str = "/epoxy/index.mjs";

/// Transports offered to clients, in display order.
pub const TRANSPORTS: &[&str] = &["/epoxy/index.mjs", "/baremux/worker.js"];

/// DNS servers used by the Wisp layer.
pub const DNS_SERVERS: &[&str] = &["1.1.1.3", "1.0.0.3"];

/// Hostnames the Wisp layer refuses to connect to.
pub const HOSTNAME_BLACKLIST: &[&str] = &["example.com"];

pub const PORT: u16 = 8080;

pub const BIND_HOST: &str = "0.0.0.0";

pub const PUBLIC_DIR: &str = "public";

pub fn transports() -> Vec<String> {
    TRANSPORTS.iter().map(|t| t.to_string()).collect()
}

pub fn dns_servers() -> Vec<String> {
    DNS_SERVERS.iter().map(|s| s.to_string()).collect()
}

pub fn hostname_blacklist() -> Vec<String> {
    HOSTNAME_BLACKLIST.iter().map(|s| s.to_string()).collect()
}
